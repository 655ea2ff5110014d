//! Anti-link warning ledger.
//!
//! Separate document from the group records, keyed `"{group}_{sender}"`.
//! Entries carry a count plus the ms timestamp of the last violation and
//! expire 5 minutes after it; expired entries are lazily deleted on the next
//! read and count as 0.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::json::JsonStore;
use crate::utils::now_ms;

/// Sliding expiry window for accumulated link violations.
pub const WARNING_WINDOW_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WarnEntry {
    count: u32,
    /// ms epoch of the last violation.
    timestamp: i64,
}

/// Store for time-windowed anti-link warnings.
pub struct AntiLinkStore {
    inner: JsonStore,
}

impl AntiLinkStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: JsonStore::open(path),
        }
    }

    fn key(group_id: &str, sender_id: &str) -> String {
        format!("{group_id}_{sender_id}")
    }

    /// Current warning count; expired entries are deleted and read as 0.
    pub fn warning_count(&self, group_id: &str, sender_id: &str) -> u32 {
        self.warning_count_at(group_id, sender_id, now_ms())
    }

    pub fn warning_count_at(&self, group_id: &str, sender_id: &str, now: i64) -> u32 {
        let key = Self::key(group_id, sender_id);
        self.inner.update_if(|all| {
            let Some(entry) = all.get(&key).and_then(decode) else {
                return (0, false);
            };
            if now - entry.timestamp > WARNING_WINDOW_MS {
                all.remove(&key);
                (0, true)
            } else {
                (entry.count, false)
            }
        })
    }

    /// Record a violation: a fresh or expired entry restarts at 1, otherwise
    /// the count is incremented and the timestamp refreshed. Returns the new
    /// count.
    pub fn add_warning(&self, group_id: &str, sender_id: &str) -> u32 {
        self.add_warning_at(group_id, sender_id, now_ms())
    }

    pub fn add_warning_at(&self, group_id: &str, sender_id: &str, now: i64) -> u32 {
        let key = Self::key(group_id, sender_id);
        self.inner.update(|all| {
            let prior = all
                .get(&key)
                .and_then(decode)
                .filter(|e| now - e.timestamp <= WARNING_WINDOW_MS)
                .map(|e| e.count)
                .unwrap_or(0);
            let entry = WarnEntry {
                count: prior + 1,
                timestamp: now,
            };
            all.insert(key.clone(), encode(&entry));
            entry.count
        })
    }

    /// Delete the entry entirely (used after a kick).
    pub fn reset_warning(&self, group_id: &str, sender_id: &str) {
        let key = Self::key(group_id, sender_id);
        self.inner.update(|all| {
            all.remove(&key);
        });
    }

    /// Raw presence check, for tests and diagnostics.
    pub fn has_entry(&self, group_id: &str, sender_id: &str) -> bool {
        self.inner.load().contains_key(&Self::key(group_id, sender_id))
    }
}

fn decode(value: &Value) -> Option<WarnEntry> {
    serde_json::from_value(value.clone()).ok()
}

fn encode(entry: &WarnEntry) -> Value {
    serde_json::to_value(entry).unwrap_or(Value::Null)
}

//! Per-group moderation record and its store.
//!
//! One JSON document holds every group, keyed by group JID. Writes go through
//! [`GroupStore::set_group`], which shallow-merges a partial object into the
//! stored record: top-level keys from the partial replace the stored keys
//! wholesale. Nested objects are NOT merged, so a caller mutating `warns` (or
//! any other sub-object) must read the full sub-object, modify it in memory,
//! and write the whole thing back. Passing `{"warns": {"u1": 5}}` alone
//! discards every other member's count.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::json::JsonStore;

/// Running quiz round for a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveQuiz {
    /// Expected answer, matched case-insensitively.
    pub answer: String,
    /// ms epoch when the question was asked.
    pub asked: i64,
}

/// Running poll for a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivePoll {
    pub question: String,
    pub options: Vec<String>,
    /// voter JID -> option index
    #[serde(default)]
    pub votes: BTreeMap<String, usize>,
}

/// Scheduled group event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEvent {
    pub name: String,
    pub date: String,
    pub desc: String,
}

/// The full moderation/settings document for one group.
///
/// This is a read-side view: every field is defaulted so partially-populated
/// records decode cleanly. Writes never serialize this struct; they go
/// through shallow-merge partials so unrelated keys survive untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupRecord {
    /// member JID -> warning count
    #[serde(default)]
    pub warns: BTreeMap<String, u32>,

    /// Warnings threshold for auto-removal.
    #[serde(default = "default_warn_limit")]
    pub warnlimit: u32,

    /// Lowercased filtered words.
    #[serde(default)]
    pub bannedwords: Vec<String>,

    #[serde(default)]
    pub mutedusers: Vec<String>,

    /// Members auto-removed on (re)join.
    #[serde(default)]
    pub blacklist: Vec<String>,

    #[serde(default)]
    pub vip: Vec<String>,

    // Media/content locks: when set, the matching content from non-admins is
    // deleted.
    #[serde(default)]
    pub lockimg: bool,
    #[serde(default)]
    pub lockvid: bool,
    #[serde(default)]
    pub lockaudio: bool,
    #[serde(default)]
    pub lockdoc: bool,
    #[serde(default)]
    pub locksticker: bool,

    #[serde(default)]
    pub antispam: bool,
    #[serde(default)]
    pub antiflood: bool,
    #[serde(default)]
    pub antinsfw: bool,
    #[serde(default)]
    pub antiword: bool,
    #[serde(default)]
    pub antibotadd: bool,
    #[serde(default)]
    pub antifake: bool,
    #[serde(default)]
    pub frozen: bool,

    /// Per-group anti-link override; `None` falls back to the global default.
    #[serde(default)]
    pub antilink: Option<bool>,

    #[serde(default = "default_flood_limit")]
    pub floodlimit: u32,
    /// Flood window in seconds.
    #[serde(default = "default_cooldown")]
    pub cooldown: u32,

    #[serde(default)]
    pub rules: Vec<String>,

    #[serde(default)]
    pub customwelcome: Option<String>,
    #[serde(default)]
    pub customgoodbye: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub motd: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,

    /// member JID -> score, clamped at 0 on deduction
    #[serde(default)]
    pub points: BTreeMap<String, i64>,

    #[serde(default)]
    pub quizscores: BTreeMap<String, i64>,

    #[serde(default)]
    pub activequiz: Option<ActiveQuiz>,

    #[serde(default)]
    pub activepoll: Option<ActivePoll>,

    /// member JID -> last daily-claim timestamp (ms epoch)
    #[serde(default)]
    pub daily: BTreeMap<String, i64>,

    #[serde(default)]
    pub event: Option<GroupEvent>,
}

fn default_warn_limit() -> u32 {
    3
}

fn default_flood_limit() -> u32 {
    7
}

fn default_cooldown() -> u32 {
    10
}

impl GroupRecord {
    /// Warning count for a member (0 when absent).
    pub fn warn_count(&self, member: &str) -> u32 {
        self.warns.get(member).copied().unwrap_or(0)
    }
}

/// Store for all per-group moderation records.
pub struct GroupStore {
    inner: JsonStore,
}

impl GroupStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: JsonStore::open(path),
        }
    }

    /// Typed view of one group's record; an empty default when the group has
    /// never been written (the default is not persisted).
    pub fn group(&self, group_id: &str) -> GroupRecord {
        let raw = self.group_raw(group_id);
        serde_json::from_value(Value::Object(raw)).unwrap_or_else(|e| {
            debug!("Undecodable record for {}: {}", group_id, e);
            GroupRecord::default()
        })
    }

    /// Raw JSON object for one group (`{}` when absent).
    pub fn group_raw(&self, group_id: &str) -> Map<String, Value> {
        match self.inner.load().remove(group_id) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Shallow-merge `partial` into the stored record and rewrite the file.
    ///
    /// Keys present in `partial` replace the stored keys entirely; keys absent
    /// from `partial` are preserved.
    pub fn set_group(&self, group_id: &str, partial: Map<String, Value>) {
        self.inner.update(|all| {
            let record = match all.get_mut(group_id) {
                Some(Value::Object(map)) => map,
                _ => {
                    all.insert(group_id.to_string(), Value::Object(Map::new()));
                    match all.get_mut(group_id) {
                        Some(Value::Object(map)) => map,
                        _ => unreachable!("just inserted an object"),
                    }
                }
            };
            for (key, value) in partial {
                record.insert(key, value);
            }
        });
    }

    /// `set_group` from a `json!({...})` literal. Non-object values are a
    /// caller bug and are dropped with a log line.
    pub fn patch(&self, group_id: &str, partial: Value) {
        match partial {
            Value::Object(map) => self.set_group(group_id, map),
            other => {
                debug!("patch for {} expects a JSON object, got {}", group_id, other);
                debug_assert!(false, "patch expects a JSON object");
            }
        }
    }

    /// Drop a group's record entirely.
    pub fn wipe(&self, group_id: &str) -> bool {
        self.inner
            .update(|all| all.remove(group_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::temp_path;
    use serde_json::json;

    #[test]
    fn absent_group_reads_as_default() {
        let store = GroupStore::open(temp_path("group-default"));
        let rec = store.group("g1");
        assert_eq!(rec.warnlimit, 3);
        assert!(rec.warns.is_empty());
        assert!(!rec.lockimg);
        // Reading must not materialize the record.
        assert!(store.inner.load().is_empty());
    }

    #[test]
    fn shallow_merge_preserves_disjoint_keys() {
        let store = GroupStore::open(temp_path("group-disjoint"));
        store.patch("g1", json!({"bannedwords": ["spam", "scam"]}));
        store.patch("g1", json!({"antispam": true}));

        let rec = store.group("g1");
        assert!(rec.antispam);
        assert_eq!(rec.bannedwords, vec!["spam", "scam"]);
    }

    #[test]
    fn nested_objects_are_replaced_wholesale() {
        let store = GroupStore::open(temp_path("group-nested"));
        store.patch("g1", json!({"warns": {"u2": 3}}));
        store.patch("g1", json!({"warns": {"u1": 5}}));

        let rec = store.group("g1");
        assert_eq!(rec.warn_count("u1"), 5);
        // u2's entry is gone: shallow merge replaces the whole sub-object.
        assert_eq!(rec.warn_count("u2"), 0);
        assert_eq!(rec.warns.len(), 1);
    }

    #[test]
    fn round_trip_across_reopen() {
        let path = temp_path("group-reopen");
        {
            let store = GroupStore::open(&path);
            store.patch(
                "g1",
                json!({
                    "warnlimit": 5,
                    "rules": ["be nice", "no links"],
                    "points": {"u1": 40},
                    "frozen": true,
                }),
            );
        }

        // Fresh handle simulates a process restart.
        let store = GroupStore::open(&path);
        let rec = store.group("g1");
        assert_eq!(rec.warnlimit, 5);
        assert_eq!(rec.rules, vec!["be nice", "no links"]);
        assert_eq!(rec.points.get("u1"), Some(&40));
        assert!(rec.frozen);
    }

    #[test]
    fn wipe_removes_only_the_target_group() {
        let store = GroupStore::open(temp_path("group-wipe"));
        store.patch("g1", json!({"frozen": true}));
        store.patch("g2", json!({"frozen": true}));

        assert!(store.wipe("g1"));
        assert!(!store.wipe("g1"));
        assert!(!store.group("g1").frozen);
        assert!(store.group("g2").frozen);
    }

    #[test]
    fn corrupt_file_resets_then_recovers() {
        let path = temp_path("group-corrupt");
        std::fs::write(&path, "oops").unwrap();

        let store = GroupStore::open(&path);
        assert_eq!(store.group("g1").warnlimit, 3);

        store.patch("g1", json!({"warnlimit": 7}));
        assert_eq!(store.group("g1").warnlimit, 7);
    }
}

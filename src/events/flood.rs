//! Flood tracking and enforcement.
//!
//! Message timestamps live in memory only (a restart forgets them); the
//! per-group limits come from the stored record (`floodlimit` messages per
//! `cooldown` seconds, gated by the `antispam` or `antiflood` flag).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info};

use crate::bot::dispatcher::{AppState, CommandCtx, IncomingMessage};
use crate::transport::{MessageRef, ParticipantAction};
use crate::utils::mention;

/// Strikes before a flooder is removed instead of warned.
const STRIKES_BEFORE_REMOVAL: u32 = 3;

#[derive(Debug, Clone, Default)]
struct UserFloodData {
    message_times: Vec<Instant>,
    strikes: u32,
}

/// In-memory flood tracker, lock-free per chat.
#[derive(Clone, Default)]
pub struct FloodTracker {
    data: Arc<DashMap<String, HashMap<String, UserFloodData>>>,
}

impl FloodTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message; returns `(is_flooding, strikes)`.
    pub fn record_message(
        &self,
        chat: &str,
        sender: &str,
        max_messages: u32,
        window_secs: u32,
    ) -> (bool, u32) {
        let now = Instant::now();
        let window = Duration::from_secs(window_secs as u64);

        let mut users = self.data.entry(chat.to_string()).or_default();
        let entry = users.entry(sender.to_string()).or_default();

        entry.message_times.retain(|&t| now.duration_since(t) < window);
        entry.message_times.push(now);

        let is_flooding = entry.message_times.len() > max_messages as usize;
        if is_flooding {
            entry.strikes += 1;
        }
        (is_flooding, entry.strikes)
    }

    pub fn reset_user(&self, chat: &str, sender: &str) {
        if let Some(mut users) = self.data.get_mut(chat) {
            users.remove(sender);
        }
    }
}

/// Flood stage of the message pipeline.
pub async fn check(
    state: &AppState,
    msg: &IncomingMessage,
    ctx: &CommandCtx,
) -> anyhow::Result<bool> {
    let record = state.store.group(&ctx.chat);
    if !record.antispam && !record.antiflood {
        return Ok(false);
    }
    if ctx.is_sender_admin || state.is_owner(&ctx.sender) {
        return Ok(false);
    }

    let (is_flooding, strikes) = state.flood.record_message(
        &ctx.chat,
        &ctx.sender,
        record.floodlimit,
        record.cooldown,
    );
    if !is_flooding {
        return Ok(false);
    }

    debug!(
        "{} flooding in {} (strike {})",
        ctx.sender, ctx.chat, strikes
    );

    let msg_ref = MessageRef {
        group_id: ctx.chat.clone(),
        id: msg.id.clone(),
        sender: ctx.sender.clone(),
    };
    let _ = state.transport.delete_message(&msg_ref).await;

    if strikes >= STRIKES_BEFORE_REMOVAL && ctx.is_bot_admin {
        info!("Removing {} from {} for flooding", ctx.sender, ctx.chat);
        state
            .transport
            .update_participants(&ctx.chat, &[ctx.sender.clone()], ParticipantAction::Remove)
            .await?;
        state.flood.reset_user(&ctx.chat, &ctx.sender);
        ctx.reply_mentions(
            state,
            &format!("🚫 {} was removed for flooding.", mention(&ctx.sender)),
            &[ctx.sender.clone()],
        )
        .await?;
    } else {
        ctx.reply_mentions(
            state,
            &format!("⚠️ {} slow down, you are flooding the chat.", mention(&ctx.sender)),
            &[ctx.sender.clone()],
        )
        .await?;
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_limit_is_not_flooding() {
        let tracker = FloodTracker::new();
        for _ in 0..5 {
            let (flooding, _) = tracker.record_message("g1", "u1", 5, 10);
            assert!(!flooding);
        }
    }

    #[test]
    fn over_limit_flags_and_accumulates_strikes() {
        let tracker = FloodTracker::new();
        for _ in 0..5 {
            tracker.record_message("g1", "u1", 5, 10);
        }
        let (flooding, strikes) = tracker.record_message("g1", "u1", 5, 10);
        assert!(flooding);
        assert_eq!(strikes, 1);

        let (flooding, strikes) = tracker.record_message("g1", "u1", 5, 10);
        assert!(flooding);
        assert_eq!(strikes, 2);
    }

    #[test]
    fn reset_clears_counters() {
        let tracker = FloodTracker::new();
        for _ in 0..7 {
            tracker.record_message("g1", "u1", 5, 10);
        }
        tracker.reset_user("g1", "u1");
        let (flooding, strikes) = tracker.record_message("g1", "u1", 5, 10);
        assert!(!flooding);
        assert_eq!(strikes, 0);
    }

    #[test]
    fn chats_are_independent() {
        let tracker = FloodTracker::new();
        for _ in 0..6 {
            tracker.record_message("g1", "u1", 5, 10);
        }
        let (flooding, _) = tracker.record_message("g2", "u1", 5, 10);
        assert!(!flooding);
    }
}

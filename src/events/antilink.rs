//! Anti-link enforcement.
//!
//! Two-strike policy over a 5-minute sliding window, independent of the
//! general warning counters. First qualifying message gets the offending
//! message deleted plus a notice; a second one inside the window gets the
//! sender removed and the ledger entry reset.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::bot::dispatcher::{AppState, CommandCtx, IncomingMessage};
use crate::transport::{MessageRef, ParticipantAction};
use crate::utils::mention;

/// Invite/link-hosting domains the filter reacts to.
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        (?:https?://)?
        (?:
            chat\.whatsapp\.com/[A-Za-z0-9]{8,} |
            wa\.me/\S+ |
            t\.me/\S+ |
            discord\.gg/\S+ |
            bit\.ly/\S+
        )",
    )
    .expect("link regex must compile")
});

/// Whether the text contains a disallowed link.
pub fn contains_link(text: &str) -> bool {
    LINK_RE.is_match(text)
}

/// Run the anti-link policy for one message. Returns `true` when the message
/// was consumed (deleted and acted on).
pub async fn check(
    state: &AppState,
    msg: &IncomingMessage,
    ctx: &CommandCtx,
) -> anyhow::Result<bool> {
    if !contains_link(&msg.text) {
        return Ok(false);
    }

    let record = state.store.group(&ctx.chat);
    let enabled = record.antilink.unwrap_or(state.config.antilink_default);
    if !enabled {
        return Ok(false);
    }

    if ctx.is_sender_admin || state.is_owner(&ctx.sender) {
        debug!("Anti-link bypass for admin {} in {}", ctx.sender, ctx.chat);
        return Ok(false);
    }
    if !ctx.is_bot_admin {
        debug!("Anti-link inactive in {}: bot is not admin", ctx.chat);
        return Ok(false);
    }

    let msg_ref = MessageRef {
        group_id: ctx.chat.clone(),
        id: msg.id.clone(),
        sender: ctx.sender.clone(),
    };
    let _ = state.transport.delete_message(&msg_ref).await;

    let count = state.antilink.add_warning(&ctx.chat, &ctx.sender);

    if count >= 2 {
        info!("Removing {} from {} for repeated links", ctx.sender, ctx.chat);
        state
            .transport
            .update_participants(&ctx.chat, &[ctx.sender.clone()], ParticipantAction::Remove)
            .await?;
        state.antilink.reset_warning(&ctx.chat, &ctx.sender);
        ctx.reply_mentions(
            state,
            &format!("🚫 {} was removed for posting links.", mention(&ctx.sender)),
            &[ctx.sender.clone()],
        )
        .await?;
    } else {
        ctx.reply_mentions(
            state,
            &format!(
                "⚠️ {} links are not allowed here. Next one gets you removed.",
                mention(&ctx.sender)
            ),
            &[ctx.sender.clone()],
        )
        .await?;
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{group_ctx, test_state};

    #[test]
    fn detects_group_invite_links() {
        assert!(contains_link("join us https://chat.whatsapp.com/AbCdEf123456"));
        assert!(contains_link("chat.whatsapp.com/AbCdEf123456"));
        assert!(contains_link("ping me on wa.me/12345"));
        assert!(!contains_link("just a normal message"));
        assert!(!contains_link("see example.com for details"));
    }

    #[tokio::test]
    async fn admin_messages_are_ignored() {
        let (state, mock) = test_state();
        state.store.patch("g1", serde_json::json!({"antilink": true}));

        let mut ctx = group_ctx("g1", "u1@s.whatsapp.net");
        ctx.is_sender_admin = true;
        let msg = crate::testutil::link_message("g1", "u1@s.whatsapp.net");

        assert!(!check(&state, &msg, &ctx).await.unwrap());
        assert!(mock.deleted.lock().is_empty());
    }

    #[tokio::test]
    async fn second_strike_removes_and_resets() {
        let (state, mock) = test_state();
        state.store.patch("g1", serde_json::json!({"antilink": true}));

        let ctx = group_ctx("g1", "u1@s.whatsapp.net");
        let msg = crate::testutil::link_message("g1", "u1@s.whatsapp.net");

        assert!(check(&state, &msg, &ctx).await.unwrap());
        assert_eq!(mock.removals().len(), 0);

        assert!(check(&state, &msg, &ctx).await.unwrap());
        let removals = mock.removals();
        assert_eq!(removals.len(), 1);
        assert_eq!(removals[0].1, vec!["u1@s.whatsapp.net".to_string()]);
        // Ledger entry is gone after the kick.
        assert!(!state.antilink.has_entry("g1", "u1@s.whatsapp.net"));
    }

    #[tokio::test]
    async fn disabled_per_group_overrides_global_default() {
        let (state, mock) = test_state();
        // Global default in test config is true; per-group override wins.
        state.store.patch("g1", serde_json::json!({"antilink": false}));

        let ctx = group_ctx("g1", "u1@s.whatsapp.net");
        let msg = crate::testutil::link_message("g1", "u1@s.whatsapp.net");

        assert!(!check(&state, &msg, &ctx).await.unwrap());
        assert!(mock.deleted.lock().is_empty());
    }
}

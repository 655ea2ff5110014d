//! Warning commands and the auto-removal policy.
//!
//! Counts live in the group record's `warns` map. A member moves from clean
//! through `1..limit-1` warnings; the warning that reaches the limit triggers
//! removal and resets the count to 0 in the same persisted update. The reset
//! is persisted before the removal call resolves, so a failed removal still
//! leaves the counter at 0.

use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::bot::dispatcher::{AppState, CommandCtx, CommandRegistry, CommandSpec, wrap};
use crate::transport::{ParticipantAction, TransportError};
use crate::utils::mention;

/// Inclusive bounds accepted by `setwarnlimit`.
pub const WARN_LIMIT_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WarnLimitError {
    #[error("warn limit must be between 1 and 20")]
    OutOfRange,
}

/// Result of one `warn` transition.
#[derive(Debug)]
pub enum WarnOutcome {
    Warned { count: u32, limit: u32 },
    Removed { limit: u32 },
    RemovalFailed { limit: u32, error: TransportError },
}

/// Apply one warning to a member, removing them at the limit.
pub async fn apply_warn(
    state: &AppState,
    group_id: &str,
    member: &str,
) -> anyhow::Result<WarnOutcome> {
    let record = state.store.group(group_id);
    let limit = record.warnlimit;

    // Full sub-object read-modify-write: writing a partial `warns` map would
    // silently drop every other member's count.
    let mut warns = record.warns.clone();
    let count = warns.get(member).copied().unwrap_or(0) + 1;

    if count >= limit {
        warns.insert(member.to_string(), 0);
        state.store.patch(group_id, json!({ "warns": warns }));

        info!("{} hit the warn limit ({}) in {}", member, limit, group_id);
        match state
            .transport
            .update_participants(group_id, &[member.to_string()], ParticipantAction::Remove)
            .await
        {
            Ok(()) => Ok(WarnOutcome::Removed { limit }),
            Err(error) => Ok(WarnOutcome::RemovalFailed { limit, error }),
        }
    } else {
        warns.insert(member.to_string(), count);
        state.store.patch(group_id, json!({ "warns": warns }));
        Ok(WarnOutcome::Warned { count, limit })
    }
}

/// Force a member's count back to 0.
pub fn reset_warn(state: &AppState, group_id: &str, member: &str) {
    let mut warns = state.store.group(group_id).warns;
    warns.insert(member.to_string(), 0);
    state.store.patch(group_id, json!({ "warns": warns }));
}

/// Set the group's warn limit, validating the 1..=20 range.
pub fn set_warn_limit(state: &AppState, group_id: &str, limit: u32) -> Result<(), WarnLimitError> {
    if !WARN_LIMIT_RANGE.contains(&limit) {
        return Err(WarnLimitError::OutOfRange);
    }
    state.store.patch(group_id, json!({ "warnlimit": limit }));
    Ok(())
}

async fn warn_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let Some(target) = ctx.target() else {
        ctx.reply(&state, "❌ Mention the member to warn.").await?;
        return Ok(());
    };

    // Skip the target token (mention or number) when collecting the reason.
    let reason = ctx
        .args
        .iter()
        .skip_while(|a| a.starts_with('@') || a.chars().all(|c| c.is_ascii_digit()))
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    match apply_warn(&state, &ctx.chat, &target).await? {
        WarnOutcome::Warned { count, limit } => {
            let mut text = format!("⚠️ {} warned ({}/{})", mention(&target), count, limit);
            if !reason.is_empty() {
                text.push_str(&format!("\nReason: {reason}"));
            }
            ctx.reply_mentions(&state, &text, &[target]).await?;
        }
        WarnOutcome::Removed { limit } => {
            ctx.reply_mentions(
                &state,
                &format!(
                    "🚫 {} reached the warn limit ({limit}/{limit}) and was removed.",
                    mention(&target)
                ),
                &[target],
            )
            .await?;
        }
        WarnOutcome::RemovalFailed { limit, error } => {
            let why = match error {
                TransportError::RateLimited => "the platform is rate limiting me",
                TransportError::NotAuthorized => "I am not allowed to remove members here",
                TransportError::Other(_) => "the removal failed",
            };
            ctx.reply_mentions(
                &state,
                &format!(
                    "⚠️ {} reached the warn limit ({limit}) but {why}.",
                    mention(&target)
                ),
                &[target],
            )
            .await?;
        }
    }
    Ok(())
}

async fn warns_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let target = ctx.target().unwrap_or_else(|| ctx.sender.clone());
    let record = state.store.group(&ctx.chat);
    let count = record.warn_count(&target);
    ctx.reply_mentions(
        &state,
        &format!(
            "ℹ️ {} has {}/{} warnings.",
            mention(&target),
            count,
            record.warnlimit
        ),
        &[target],
    )
    .await
}

async fn unwarn_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let Some(target) = ctx.target() else {
        ctx.reply(&state, "❌ Mention the member to clear.").await?;
        return Ok(());
    };
    reset_warn(&state, &ctx.chat, &target);
    ctx.reply_mentions(
        &state,
        &format!("✅ Warnings cleared for {}.", mention(&target)),
        &[target],
    )
    .await
}

async fn resetwarns_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    state.store.patch(&ctx.chat, json!({ "warns": {} }));
    ctx.reply(&state, "✅ All warnings in this group were cleared.")
        .await
}

async fn setwarnlimit_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let parsed = ctx.arg(0).and_then(|a| a.parse::<u32>().ok());
    let Some(limit) = parsed else {
        ctx.reply(&state, "❌ Usage: setwarnlimit <1-20>").await?;
        return Ok(());
    };
    match set_warn_limit(&state, &ctx.chat, limit) {
        Ok(()) => {
            ctx.reply(&state, &format!("✅ Warn limit set to {limit}."))
                .await
        }
        Err(e) => ctx.reply(&state, &format!("❌ {e}.")).await,
    }
}

pub fn register(reg: &mut CommandRegistry) {
    reg.register(
        CommandSpec::admin(
            "warn",
            &[],
            "moderation",
            "Warn a member; removal at the limit",
            wrap(warn_command),
        )
        .needs_bot_admin(),
    );
    reg.register(CommandSpec::group(
        "warns",
        &["warnstatus"],
        "moderation",
        "Show a member's warning count",
        wrap(warns_command),
    ));
    reg.register(CommandSpec::admin(
        "unwarn",
        &["resetwarn"],
        "moderation",
        "Reset a member's warnings to zero",
        wrap(unwarn_command),
    ));
    reg.register(CommandSpec::admin(
        "resetwarns",
        &[],
        "moderation",
        "Clear all warnings in the group",
        wrap(resetwarns_command),
    ));
    reg.register(CommandSpec::admin(
        "setwarnlimit",
        &["warnlimit"],
        "moderation",
        "Set the warn limit (1-20)",
        wrap(setwarnlimit_command),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;

    const G: &str = "g1@g.us";
    const U: &str = "u1@s.whatsapp.net";

    #[tokio::test]
    async fn warnings_increase_until_limit_then_reset() {
        let (state, mock) = test_state();

        for expected in 1..=2 {
            match apply_warn(&state, G, U).await.unwrap() {
                WarnOutcome::Warned { count, limit } => {
                    assert_eq!(count, expected);
                    assert_eq!(limit, 3);
                }
                other => panic!("unexpected outcome {other:?}"),
            }
            assert_eq!(state.store.group(G).warn_count(U), expected);
        }

        // Third warning reaches the default limit of 3.
        assert!(matches!(
            apply_warn(&state, G, U).await.unwrap(),
            WarnOutcome::Removed { limit: 3 }
        ));
        assert_eq!(mock.removals().len(), 1);
        // Count reset in the same logical update.
        assert_eq!(state.store.group(G).warn_count(U), 0);
    }

    #[tokio::test]
    async fn failed_removal_still_resets_the_count() {
        let (state, mock) = test_state();
        *mock.fail_participant_updates.lock() = Some(TransportError::NotAuthorized);

        apply_warn(&state, G, U).await.unwrap();
        apply_warn(&state, G, U).await.unwrap();
        let outcome = apply_warn(&state, G, U).await.unwrap();

        assert!(matches!(
            outcome,
            WarnOutcome::RemovalFailed {
                error: TransportError::NotAuthorized,
                ..
            }
        ));
        assert_eq!(state.store.group(G).warn_count(U), 0);
    }

    #[tokio::test]
    async fn warning_two_members_keeps_both_counts() {
        let (state, _mock) = test_state();
        apply_warn(&state, G, U).await.unwrap();
        apply_warn(&state, G, "u2@s.whatsapp.net").await.unwrap();

        let record = state.store.group(G);
        assert_eq!(record.warn_count(U), 1);
        assert_eq!(record.warn_count("u2@s.whatsapp.net"), 1);
    }

    #[tokio::test]
    async fn reset_warn_forces_zero() {
        let (state, _mock) = test_state();
        apply_warn(&state, G, U).await.unwrap();
        reset_warn(&state, G, U);
        assert_eq!(state.store.group(G).warn_count(U), 0);
    }

    #[tokio::test]
    async fn warn_limit_bounds_are_enforced() {
        let (state, _mock) = test_state();
        assert_eq!(set_warn_limit(&state, G, 0), Err(WarnLimitError::OutOfRange));
        assert_eq!(
            set_warn_limit(&state, G, 21),
            Err(WarnLimitError::OutOfRange)
        );
        // Rejected values leave the stored limit unchanged.
        assert_eq!(state.store.group(G).warnlimit, 3);

        assert_eq!(set_warn_limit(&state, G, 5), Ok(()));
        assert_eq!(state.store.group(G).warnlimit, 5);

        assert_eq!(set_warn_limit(&state, G, 1), Ok(()));
        assert_eq!(set_warn_limit(&state, G, 20), Ok(()));
    }

    #[tokio::test]
    async fn custom_limit_changes_the_threshold() {
        let (state, mock) = test_state();
        set_warn_limit(&state, G, 2).unwrap();

        apply_warn(&state, G, U).await.unwrap();
        assert!(matches!(
            apply_warn(&state, G, U).await.unwrap(),
            WarnOutcome::Removed { limit: 2 }
        ));
        assert_eq!(mock.removals().len(), 1);
    }
}

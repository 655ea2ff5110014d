//! Group points: admin-granted scores, a leaderboard and a daily claim.

use serde_json::json;

use crate::bot::dispatcher::{AppState, CommandCtx, CommandRegistry, CommandSpec, wrap};
use crate::utils::{format_duration, mention, now_ms};

/// One claim per member per 24 hours.
const DAILY_INTERVAL_MS: i64 = 24 * 60 * 60 * 1000;
const DAILY_REWARD: i64 = 50;

async fn points_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let target = ctx.target().unwrap_or_else(|| ctx.sender.clone());
    let record = state.store.group(&ctx.chat);
    let score = record.points.get(&target).copied().unwrap_or(0);
    ctx.reply_mentions(
        &state,
        &format!("💰 {} has {} points.", mention(&target), score),
        &[target],
    )
    .await
}

async fn addpoints_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    adjust_points(ctx, state, 1).await
}

async fn delpoints_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    adjust_points(ctx, state, -1).await
}

async fn adjust_points(ctx: CommandCtx, state: AppState, sign: i64) -> anyhow::Result<()> {
    let Some(target) = ctx.target() else {
        ctx.reply(&state, "❌ Mention the member.").await?;
        return Ok(());
    };
    // Without a mention the first argument is the target number itself.
    let amount_args = if ctx.mentions.is_empty() && !ctx.args.is_empty() {
        &ctx.args[1..]
    } else {
        &ctx.args[..]
    };
    let amount = amount_args
        .iter()
        .find_map(|a| a.parse::<i64>().ok())
        .filter(|n| *n > 0);
    let Some(amount) = amount else {
        ctx.reply(&state, "❌ Give a positive amount.").await?;
        return Ok(());
    };

    let mut points = state.store.group(&ctx.chat).points;
    let entry = points.entry(target.clone()).or_insert(0);
    // Deductions clamp at zero.
    *entry = (*entry + sign * amount).max(0);
    let total = *entry;
    state.store.patch(&ctx.chat, json!({ "points": points }));

    ctx.reply_mentions(
        &state,
        &format!("💰 {} now has {} points.", mention(&target), total),
        &[target],
    )
    .await
}

async fn top_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let points = state.store.group(&ctx.chat).points;
    if points.is_empty() {
        ctx.reply(&state, "ℹ️ Nobody has points yet.").await?;
        return Ok(());
    }

    let mut ranked: Vec<(&String, &i64)> = points.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1));

    let mentions: Vec<String> = ranked.iter().take(10).map(|(jid, _)| (*jid).clone()).collect();
    let body: Vec<String> = ranked
        .iter()
        .take(10)
        .enumerate()
        .map(|(i, (jid, score))| format!("{}. {} — {}", i + 1, mention(jid), score))
        .collect();

    ctx.reply_mentions(&state, &format!("🏆 *Leaderboard*\n{}", body.join("\n")), &mentions)
        .await
}

async fn daily_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    claim_daily(&ctx, &state, now_ms()).await
}

async fn claim_daily(ctx: &CommandCtx, state: &AppState, now: i64) -> anyhow::Result<()> {
    let record = state.store.group(&ctx.chat);
    let last = record.daily.get(&ctx.sender).copied().unwrap_or(0);
    let elapsed = now - last;

    if elapsed < DAILY_INTERVAL_MS {
        let wait = (DAILY_INTERVAL_MS - elapsed) / 1000;
        ctx.reply(
            state,
            &format!("⏳ Already claimed. Come back in {}.", format_duration(wait as u64)),
        )
        .await?;
        return Ok(());
    }

    let mut daily = record.daily.clone();
    daily.insert(ctx.sender.clone(), now);
    let mut points = record.points.clone();
    let total = {
        let entry = points.entry(ctx.sender.clone()).or_insert(0);
        *entry += DAILY_REWARD;
        *entry
    };
    state
        .store
        .patch(&ctx.chat, json!({ "daily": daily, "points": points }));

    ctx.reply_mentions(
        state,
        &format!(
            "🎁 {} claimed {} daily points (total {}).",
            mention(&ctx.sender),
            DAILY_REWARD,
            total
        ),
        &[ctx.sender.clone()],
    )
    .await
}

pub fn register(reg: &mut CommandRegistry) {
    reg.register(CommandSpec::group(
        "points",
        &[],
        "fun",
        "Show a member's points",
        wrap(points_command),
    ));
    reg.register(CommandSpec::admin(
        "addpoints",
        &[],
        "fun",
        "Grant points to a member",
        wrap(addpoints_command),
    ));
    reg.register(CommandSpec::admin(
        "delpoints",
        &[],
        "fun",
        "Deduct points (floors at 0)",
        wrap(delpoints_command),
    ));
    reg.register(CommandSpec::group(
        "top",
        &["leaderboard"],
        "fun",
        "Points leaderboard",
        wrap(top_command),
    ));
    reg.register(CommandSpec::group(
        "daily",
        &[],
        "fun",
        "Claim the daily point bonus",
        wrap(daily_command),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{group_ctx, test_state};

    fn admin_ctx_with(target: &str, amount: &str) -> crate::bot::dispatcher::CommandCtx {
        let mut ctx = group_ctx("g1", "admin@s.whatsapp.net");
        ctx.mentions = vec![target.to_string()];
        ctx.args = vec![amount.to_string()];
        ctx
    }

    #[tokio::test]
    async fn deduction_clamps_at_zero() {
        let (state, _mock) = test_state();
        let u = "u1@s.whatsapp.net";

        adjust_points(admin_ctx_with(u, "10"), state.clone(), 1)
            .await
            .unwrap();
        assert_eq!(state.store.group("g1").points.get(u), Some(&10));

        adjust_points(admin_ctx_with(u, "25"), state.clone(), -1)
            .await
            .unwrap();
        assert_eq!(state.store.group("g1").points.get(u), Some(&0));
    }

    #[tokio::test]
    async fn daily_claim_respects_the_window() {
        let (state, mock) = test_state();
        let ctx = group_ctx("g1", "u1@s.whatsapp.net");

        claim_daily(&ctx, &state, 1_000).await.unwrap();
        assert_eq!(
            state.store.group("g1").points.get("u1@s.whatsapp.net"),
            Some(&DAILY_REWARD)
        );

        // Second claim inside 24h is refused.
        claim_daily(&ctx, &state, 2_000).await.unwrap();
        assert!(mock.last_message().unwrap().text.starts_with('⏳'));
        assert_eq!(
            state.store.group("g1").points.get("u1@s.whatsapp.net"),
            Some(&DAILY_REWARD)
        );

        // After the window it works again.
        claim_daily(&ctx, &state, 1_000 + DAILY_INTERVAL_MS).await.unwrap();
        assert_eq!(
            state.store.group("g1").points.get("u1@s.whatsapp.net"),
            Some(&(DAILY_REWARD * 2))
        );
    }
}

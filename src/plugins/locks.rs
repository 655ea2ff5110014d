//! Media locks and boolean guard toggles.

use serde_json::json;

use crate::bot::dispatcher::{AppState, CommandCtx, CommandRegistry, CommandSpec, wrap};
use crate::utils::parse_toggle;

/// Media lock keys addressable via `lock <kind>`.
const LOCK_KEYS: &[(&str, &str)] = &[
    ("img", "lockimg"),
    ("vid", "lockvid"),
    ("audio", "lockaudio"),
    ("doc", "lockdoc"),
    ("sticker", "locksticker"),
];

/// Standalone guard flags, each its own command.
const GUARD_FLAGS: &[(&str, &str, &str)] = &[
    ("antiword", "antiword", "Delete messages containing banned words"),
    ("antispam", "antispam", "Delete and punish flooding"),
    ("antiflood", "antiflood", "Track message bursts"),
    ("antinsfw", "antinsfw", "Delete NSFW links"),
    ("antibotadd", "antibotadd", "Remove bots added by non-admins"),
    ("antifake", "antifake", "Remove foreign-prefix numbers on join"),
    ("freeze", "frozen", "Ignore non-admin commands entirely"),
];

async fn lock_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let (Some(kind), Some(toggle)) = (ctx.arg(0), ctx.arg(1).and_then(parse_toggle)) else {
        ctx.reply(&state, "❌ Usage: lock <img|vid|audio|doc|sticker> on|off")
            .await?;
        return Ok(());
    };

    let Some((_, key)) = LOCK_KEYS.iter().find(|(k, _)| *k == kind) else {
        ctx.reply(&state, "❌ Unknown media kind. Use img, vid, audio, doc or sticker.")
            .await?;
        return Ok(());
    };

    let mut partial = serde_json::Map::new();
    partial.insert(key.to_string(), json!(toggle));
    state.store.set_group(&ctx.chat, partial);
    ctx.reply(
        &state,
        &format!(
            "🔒 {kind} is now *{}* for non-admins.",
            if toggle { "locked" } else { "unlocked" }
        ),
    )
    .await
}

async fn locks_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let record = state.store.group(&ctx.chat);
    let raw = serde_json::to_value(&record)?;

    let mut lines = vec!["🔒 *Lock status*".to_string()];
    for (kind, key) in LOCK_KEYS {
        let on = raw.get(*key).and_then(|v| v.as_bool()).unwrap_or(false);
        lines.push(format!("• {kind}: {}", if on { "locked" } else { "open" }));
    }
    for (name, key, _) in GUARD_FLAGS {
        let on = raw.get(*key).and_then(|v| v.as_bool()).unwrap_or(false);
        lines.push(format!("• {name}: {}", if on { "on" } else { "off" }));
    }
    ctx.reply(&state, &lines.join("\n")).await
}

fn toggle_handler(
    key: &'static str,
) -> impl Fn(CommandCtx, AppState) -> crate::bot::dispatcher::HandlerFuture + Send + Sync + 'static {
    move |ctx: CommandCtx, state: AppState| {
        Box::pin(async move {
            let Some(toggle) = ctx.arg(0).and_then(parse_toggle) else {
                ctx.reply(&state, &format!("❌ Usage: {key} on|off")).await?;
                return Ok(());
            };
            let mut partial = serde_json::Map::new();
            partial.insert(key.to_string(), json!(toggle));
            state.store.set_group(&ctx.chat, partial);
            ctx.reply(
                &state,
                &format!("✅ {key} turned *{}*.", if toggle { "on" } else { "off" }),
            )
            .await
        })
    }
}

async fn setflood_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let Some(limit) = ctx.arg(0).and_then(|a| a.parse::<u32>().ok()).filter(|n| *n > 0) else {
        ctx.reply(&state, "❌ Usage: setflood <messages>").await?;
        return Ok(());
    };
    state.store.patch(&ctx.chat, json!({ "floodlimit": limit }));
    ctx.reply(&state, &format!("✅ Flood limit set to {limit} messages."))
        .await
}

async fn setcooldown_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let Some(secs) = ctx.arg(0).and_then(|a| a.parse::<u32>().ok()).filter(|n| *n > 0) else {
        ctx.reply(&state, "❌ Usage: setcooldown <seconds>").await?;
        return Ok(());
    };
    state.store.patch(&ctx.chat, json!({ "cooldown": secs }));
    ctx.reply(&state, &format!("✅ Flood window set to {secs}s."))
        .await
}

pub fn register(reg: &mut CommandRegistry) {
    reg.register(
        CommandSpec::admin(
            "lock",
            &[],
            "locks",
            "Lock a media kind for non-admins",
            wrap(lock_command),
        )
        .needs_bot_admin(),
    );
    reg.register(CommandSpec::group(
        "locks",
        &["locked"],
        "locks",
        "Show all lock and guard flags",
        wrap(locks_command),
    ));
    for &(name, key, description) in GUARD_FLAGS {
        reg.register(CommandSpec::admin(
            name,
            &[],
            "locks",
            description,
            std::sync::Arc::new(toggle_handler(key)),
        ));
    }
    reg.register(CommandSpec::admin(
        "setflood",
        &[],
        "locks",
        "Messages allowed inside the flood window",
        wrap(setflood_command),
    ));
    reg.register(CommandSpec::admin(
        "setcooldown",
        &[],
        "locks",
        "Flood window length in seconds",
        wrap(setcooldown_command),
    ));
}

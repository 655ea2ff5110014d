//! Group meta texts: welcome/goodbye templates, note, topic, motd, mood and
//! the scheduled event.

use serde_json::json;

use crate::bot::dispatcher::{AppState, CommandCtx, CommandRegistry, CommandSpec, Handler, wrap};

/// Nullable string fields settable via `set<field> <text>`.
const TEXT_FIELDS: &[(&str, &str, &str)] = &[
    ("setwelcome", "customwelcome", "Set the welcome text ({user} placeholder)"),
    ("setgoodbye", "customgoodbye", "Set the goodbye text ({user} placeholder)"),
    ("setnote", "note", "Pin a group note"),
    ("settopic", "topic", "Set the group topic line"),
    ("setmotd", "motd", "Set the message of the day"),
    ("setmood", "mood", "Set the group mood"),
];

fn clear_text_handler(key: &'static str) -> Handler {
    std::sync::Arc::new(move |ctx: CommandCtx, state: AppState| {
        Box::pin(async move {
            let mut partial = serde_json::Map::new();
            partial.insert(key.to_string(), serde_json::Value::Null);
            state.store.set_group(&ctx.chat, partial);
            ctx.reply(&state, &format!("✅ {key} cleared.")).await
        })
    })
}

fn set_text_handler(key: &'static str) -> Handler {
    std::sync::Arc::new(move |ctx: CommandCtx, state: AppState| {
        Box::pin(async move {
            let text = ctx.args_joined(0);
            let mut partial = serde_json::Map::new();
            if text.is_empty() || text == "off" {
                partial.insert(key.to_string(), serde_json::Value::Null);
                state.store.set_group(&ctx.chat, partial);
                ctx.reply(&state, &format!("✅ {key} cleared.")).await
            } else {
                partial.insert(key.to_string(), json!(text));
                state.store.set_group(&ctx.chat, partial);
                ctx.reply(&state, &format!("✅ {key} saved.")).await
            }
        })
    })
}

async fn note_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let record = state.store.group(&ctx.chat);
    let mut lines = Vec::new();
    if let Some(topic) = &record.topic {
        lines.push(format!("🏷 Topic: {topic}"));
    }
    if let Some(motd) = &record.motd {
        lines.push(format!("📣 MOTD: {motd}"));
    }
    if let Some(mood) = &record.mood {
        lines.push(format!("🙂 Mood: {mood}"));
    }
    if let Some(note) = &record.note {
        lines.push(format!("📌 Note: {note}"));
    }
    if lines.is_empty() {
        ctx.reply(&state, "ℹ️ Nothing saved for this group yet.").await
    } else {
        ctx.reply(&state, &lines.join("\n")).await
    }
}

async fn setevent_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    // setevent <name> | <date> | <description>
    let raw = ctx.args_joined(0);
    let parts: Vec<&str> = raw.split('|').map(str::trim).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        ctx.reply(&state, "❌ Usage: setevent <name> | <date> | <description>")
            .await?;
        return Ok(());
    }
    state.store.patch(
        &ctx.chat,
        json!({ "event": { "name": parts[0], "date": parts[1], "desc": parts[2] } }),
    );
    ctx.reply(&state, &format!("📅 Event *{}* scheduled for {}.", parts[0], parts[1]))
        .await
}

async fn event_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    match state.store.group(&ctx.chat).event {
        Some(event) => {
            ctx.reply(
                &state,
                &format!("📅 *{}*\n🗓 {}\n{}", event.name, event.date, event.desc),
            )
            .await
        }
        None => ctx.reply(&state, "ℹ️ No event scheduled.").await,
    }
}

async fn delevent_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    state.store.patch(&ctx.chat, json!({ "event": null }));
    ctx.reply(&state, "✅ Event cleared.").await
}

pub fn register(reg: &mut CommandRegistry) {
    for &(name, key, description) in TEXT_FIELDS {
        reg.register(CommandSpec::admin(
            name,
            &[],
            "group",
            description,
            set_text_handler(key),
        ));
    }
    reg.register(CommandSpec::admin(
        "resetwelcome",
        &[],
        "group",
        "Restore the default welcome text",
        clear_text_handler("customwelcome"),
    ));
    reg.register(CommandSpec::admin(
        "resetgoodbye",
        &[],
        "group",
        "Restore the default goodbye text",
        clear_text_handler("customgoodbye"),
    ));
    reg.register(CommandSpec::group(
        "note",
        &["info"],
        "group",
        "Show the saved topic, motd, mood and note",
        wrap(note_command),
    ));
    reg.register(CommandSpec::admin(
        "setevent",
        &[],
        "group",
        "Schedule a group event (name | date | description)",
        wrap(setevent_command),
    ));
    reg.register(CommandSpec::group(
        "event",
        &[],
        "group",
        "Show the scheduled event",
        wrap(event_command),
    ));
    reg.register(CommandSpec::admin(
        "delevent",
        &[],
        "group",
        "Clear the scheduled event",
        wrap(delevent_command),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{group_ctx, test_state};

    #[tokio::test]
    async fn setevent_parses_three_fields() {
        let (state, _mock) = test_state();
        let mut ctx = group_ctx("g1", "admin@s.whatsapp.net");
        ctx.args = "movie night | friday 8pm | bring snacks"
            .split(' ')
            .map(str::to_string)
            .collect();

        setevent_command(ctx, state.clone()).await.unwrap();
        let event = state.store.group("g1").event.unwrap();
        assert_eq!(event.name, "movie night");
        assert_eq!(event.date, "friday 8pm");
        assert_eq!(event.desc, "bring snacks");
    }

    #[tokio::test]
    async fn delevent_clears_without_touching_other_fields() {
        let (state, _mock) = test_state();
        state.store.patch(
            "g1",
            json!({
                "event": {"name": "x", "date": "y", "desc": "z"},
                "motd": "hello",
            }),
        );

        let ctx = group_ctx("g1", "admin@s.whatsapp.net");
        delevent_command(ctx, state.clone()).await.unwrap();

        let record = state.store.group("g1");
        assert!(record.event.is_none());
        assert_eq!(record.motd.as_deref(), Some("hello"));
    }
}

//! Anti-link toggle commands. Enforcement lives in `events::antilink`.

use serde_json::json;

use crate::bot::dispatcher::{AppState, CommandCtx, CommandRegistry, CommandSpec, wrap};
use crate::utils::parse_toggle;

async fn antilink_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    match ctx.arg(0) {
        Some("status") | None => {
            let record = state.store.group(&ctx.chat);
            let effective = record.antilink.unwrap_or(state.config.antilink_default);
            let source = if record.antilink.is_some() {
                "group setting"
            } else {
                "global default"
            };
            ctx.reply(
                &state,
                &format!(
                    "🔗 Anti-link is *{}* ({source}).",
                    if effective { "on" } else { "off" }
                ),
            )
            .await
        }
        Some(arg) => match parse_toggle(arg) {
            Some(enabled) => {
                state.store.patch(&ctx.chat, json!({ "antilink": enabled }));
                ctx.reply(
                    &state,
                    &format!("✅ Anti-link turned *{}*.", if enabled { "on" } else { "off" }),
                )
                .await
            }
            None => {
                ctx.reply(&state, "❌ Usage: antilink on|off|status").await
            }
        },
    }
}

pub fn register(reg: &mut CommandRegistry) {
    reg.register(CommandSpec::admin(
        "antilink",
        &[],
        "moderation",
        "Toggle link removal with two-strike kick",
        wrap(antilink_command),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{group_ctx, test_state};

    #[tokio::test]
    async fn toggle_persists_per_group_override() {
        let (state, _mock) = test_state();
        let mut ctx = group_ctx("g1", "admin@s.whatsapp.net");
        ctx.args = vec!["off".to_string()];

        antilink_command(ctx, state.clone()).await.unwrap();
        assert_eq!(state.store.group("g1").antilink, Some(false));
    }

    #[tokio::test]
    async fn status_reports_global_default_when_unset() {
        let (state, mock) = test_state();
        let mut ctx = group_ctx("g1", "admin@s.whatsapp.net");
        ctx.args = vec!["status".to_string()];

        antilink_command(ctx, state).await.unwrap();
        let text = mock.last_message().unwrap().text;
        assert!(text.contains("global default"));
        assert!(text.contains("*on*"));
    }
}

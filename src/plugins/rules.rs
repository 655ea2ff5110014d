//! Group rules: an ordered list of numbered entries.

use serde_json::json;

use crate::bot::dispatcher::{AppState, CommandCtx, CommandRegistry, CommandSpec, wrap};

async fn addrule_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let rule = ctx.args_joined(0);
    if rule.is_empty() {
        ctx.reply(&state, "❌ Usage: addrule <text>").await?;
        return Ok(());
    }
    let mut rules = state.store.group(&ctx.chat).rules;
    rules.push(rule);
    let n = rules.len();
    state.store.patch(&ctx.chat, json!({ "rules": rules }));
    ctx.reply(&state, &format!("✅ Rule {n} added.")).await
}

async fn delrule_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let mut rules = state.store.group(&ctx.chat).rules;
    let parsed = ctx.arg(0).and_then(|a| a.parse::<usize>().ok());
    let Some(n) = parsed.filter(|n| (1..=rules.len()).contains(n)) else {
        ctx.reply(&state, "❌ Usage: delrule <number>").await?;
        return Ok(());
    };
    rules.remove(n - 1);
    state.store.patch(&ctx.chat, json!({ "rules": rules }));
    ctx.reply(&state, &format!("✅ Rule {n} removed.")).await
}

async fn rules_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let rules = state.store.group(&ctx.chat).rules;
    if rules.is_empty() {
        ctx.reply(&state, "ℹ️ No rules set. Admins can add some with addrule.")
            .await
    } else {
        let body: Vec<String> = rules
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {}", i + 1, r))
            .collect();
        ctx.reply(&state, &format!("📜 *Group rules*\n{}", body.join("\n")))
            .await
    }
}

pub fn register(reg: &mut CommandRegistry) {
    reg.register(CommandSpec::admin(
        "addrule",
        &[],
        "rules",
        "Append a group rule",
        wrap(addrule_command),
    ));
    reg.register(CommandSpec::admin(
        "delrule",
        &[],
        "rules",
        "Delete a rule by number",
        wrap(delrule_command),
    ));
    reg.register(CommandSpec::group(
        "rules",
        &[],
        "rules",
        "Show the group rules",
        wrap(rules_command),
    ));
}

//! Menu rendering from the command registry.

use std::collections::BTreeMap;

use crate::bot::dispatcher::{AppState, CommandCtx, CommandRegistry, CommandSpec, wrap};

async fn menu_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    if let Some(name) = ctx.arg(0) {
        let text = match state.registry.find(&name.to_lowercase()) {
            Some(spec) => {
                let mut line = format!(
                    "📖 *{}{}* — {}",
                    state.config.command_prefix, spec.name, spec.description
                );
                if !spec.aliases.is_empty() {
                    line.push_str(&format!("\nAliases: {}", spec.aliases.join(", ")));
                }
                if spec.admin_only {
                    line.push_str("\nAdmins only.");
                }
                line
            }
            None => format!("❌ No such command: {name}"),
        };
        ctx.reply(&state, &text).await?;
        return Ok(());
    }

    let mut by_category: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for spec in state.registry.all() {
        by_category
            .entry(spec.category)
            .or_default()
            .push(format!("{}{}", state.config.command_prefix, spec.name));
    }

    let mut out = String::from("🤖 *Warden commands*\n");
    for (category, names) in by_category {
        out.push_str(&format!("\n*{category}*\n{}\n", names.join(" · ")));
    }
    out.push_str(&format!(
        "\nUse {}menu <command> for details.",
        state.config.command_prefix
    ));
    ctx.reply(&state, &out).await
}

pub fn register(reg: &mut CommandRegistry) {
    reg.register(CommandSpec::group(
        "menu",
        &["help", "commands"],
        "general",
        "List commands, or describe one",
        wrap(menu_command),
    ));
}

//! Member lists: blacklist, muted users, VIPs and the banned-word list.

use serde_json::json;

use crate::bot::dispatcher::{AppState, CommandCtx, CommandRegistry, CommandSpec, wrap};
use crate::utils::mention;

fn add_unique(list: &mut Vec<String>, item: String) -> bool {
    if list.contains(&item) {
        false
    } else {
        list.push(item);
        true
    }
}

fn remove_item(list: &mut Vec<String>, item: &str) -> bool {
    let before = list.len();
    list.retain(|x| x != item);
    list.len() < before
}

async fn blacklist_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let record = state.store.group(&ctx.chat);
    let mut blacklist = record.blacklist;

    match (ctx.arg(0), ctx.target_after(1)) {
        (Some("add"), Some(target)) => {
            if add_unique(&mut blacklist, target.clone()) {
                state.store.patch(&ctx.chat, json!({ "blacklist": blacklist }));
                ctx.reply_mentions(
                    &state,
                    &format!("⛔ {} is blacklisted and will be removed on join.", mention(&target)),
                    &[target],
                )
                .await
            } else {
                ctx.reply(&state, "ℹ️ Already blacklisted.").await
            }
        }
        (Some("del"), Some(target)) => {
            if remove_item(&mut blacklist, &target) {
                state.store.patch(&ctx.chat, json!({ "blacklist": blacklist }));
                ctx.reply_mentions(
                    &state,
                    &format!("✅ {} removed from the blacklist.", mention(&target)),
                    &[target],
                )
                .await
            } else {
                ctx.reply(&state, "ℹ️ Not on the blacklist.").await
            }
        }
        (Some("list"), _) => {
            if blacklist.is_empty() {
                ctx.reply(&state, "ℹ️ The blacklist is empty.").await
            } else {
                let lines: Vec<String> = blacklist.iter().map(|j| format!("• {}", mention(j))).collect();
                ctx.reply_mentions(
                    &state,
                    &format!("⛔ *Blacklist*\n{}", lines.join("\n")),
                    &blacklist,
                )
                .await
            }
        }
        _ => ctx.reply(&state, "❌ Usage: blacklist add|del|list [member]").await,
    }
}

async fn muteuser_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let Some(target) = ctx.target() else {
        ctx.reply(&state, "❌ Mention the member to mute.").await?;
        return Ok(());
    };
    let mut muted = state.store.group(&ctx.chat).mutedusers;
    if add_unique(&mut muted, target.clone()) {
        state.store.patch(&ctx.chat, json!({ "mutedusers": muted }));
        ctx.reply_mentions(
            &state,
            &format!("🔇 {} is muted; their messages will be deleted.", mention(&target)),
            &[target],
        )
        .await
    } else {
        ctx.reply(&state, "ℹ️ Already muted.").await
    }
}

async fn unmuteuser_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let Some(target) = ctx.target() else {
        ctx.reply(&state, "❌ Mention the member to unmute.").await?;
        return Ok(());
    };
    let mut muted = state.store.group(&ctx.chat).mutedusers;
    if remove_item(&mut muted, &target) {
        state.store.patch(&ctx.chat, json!({ "mutedusers": muted }));
        ctx.reply_mentions(
            &state,
            &format!("🔊 {} can speak again.", mention(&target)),
            &[target],
        )
        .await
    } else {
        ctx.reply(&state, "ℹ️ That member is not muted.").await
    }
}

async fn vip_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let mut vip = state.store.group(&ctx.chat).vip;
    match (ctx.arg(0), ctx.target_after(1)) {
        (Some("add"), Some(target)) => {
            if add_unique(&mut vip, target.clone()) {
                state.store.patch(&ctx.chat, json!({ "vip": vip }));
                ctx.reply_mentions(&state, &format!("⭐ {} is now VIP.", mention(&target)), &[target])
                    .await
            } else {
                ctx.reply(&state, "ℹ️ Already VIP.").await
            }
        }
        (Some("del"), Some(target)) => {
            if remove_item(&mut vip, &target) {
                state.store.patch(&ctx.chat, json!({ "vip": vip }));
                ctx.reply_mentions(
                    &state,
                    &format!("✅ {} lost VIP status.", mention(&target)),
                    &[target],
                )
                .await
            } else {
                ctx.reply(&state, "ℹ️ Not a VIP.").await
            }
        }
        (Some("list"), _) => {
            if vip.is_empty() {
                ctx.reply(&state, "ℹ️ No VIPs yet.").await
            } else {
                let lines: Vec<String> = vip.iter().map(|j| format!("• {}", mention(j))).collect();
                ctx.reply_mentions(&state, &format!("⭐ *VIPs*\n{}", lines.join("\n")), &vip)
                    .await
            }
        }
        _ => ctx.reply(&state, "❌ Usage: vip add|del|list [member]").await,
    }
}

async fn banword_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let word = ctx.args_joined(0).to_lowercase();
    if word.is_empty() {
        ctx.reply(&state, "❌ Usage: banword <word>").await?;
        return Ok(());
    }
    let mut words = state.store.group(&ctx.chat).bannedwords;
    if add_unique(&mut words, word.clone()) {
        state.store.patch(&ctx.chat, json!({ "bannedwords": words }));
        ctx.reply(&state, &format!("🤐 Added *{word}* to the word filter."))
            .await
    } else {
        ctx.reply(&state, "ℹ️ That word is already filtered.").await
    }
}

async fn unbanword_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let word = ctx.args_joined(0).to_lowercase();
    let mut words = state.store.group(&ctx.chat).bannedwords;
    if remove_item(&mut words, &word) {
        state.store.patch(&ctx.chat, json!({ "bannedwords": words }));
        ctx.reply(&state, &format!("✅ Removed *{word}* from the word filter."))
            .await
    } else {
        ctx.reply(&state, "ℹ️ That word is not filtered.").await
    }
}

async fn banwords_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let words = state.store.group(&ctx.chat).bannedwords;
    if words.is_empty() {
        ctx.reply(&state, "ℹ️ The word filter is empty.").await
    } else {
        ctx.reply(&state, &format!("🤐 Filtered words: {}", words.join(", ")))
            .await
    }
}

pub fn register(reg: &mut CommandRegistry) {
    reg.register(
        CommandSpec::admin(
            "blacklist",
            &["bl"],
            "lists",
            "Auto-remove listed members on join",
            wrap(blacklist_command),
        )
        .needs_bot_admin(),
    );
    reg.register(CommandSpec::admin(
        "muteuser",
        &[],
        "lists",
        "Delete all messages from a member",
        wrap(muteuser_command),
    ));
    reg.register(CommandSpec::admin(
        "unmuteuser",
        &[],
        "lists",
        "Lift a member mute",
        wrap(unmuteuser_command),
    ));
    reg.register(CommandSpec::admin(
        "vip",
        &[],
        "lists",
        "Manage the VIP list",
        wrap(vip_command),
    ));
    reg.register(CommandSpec::admin(
        "banword",
        &[],
        "lists",
        "Add a word to the filter",
        wrap(banword_command),
    ));
    reg.register(CommandSpec::admin(
        "unbanword",
        &[],
        "lists",
        "Remove a word from the filter",
        wrap(unbanword_command),
    ));
    reg.register(CommandSpec::group(
        "banwords",
        &[],
        "lists",
        "Show the filtered words",
        wrap(banwords_command),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{group_ctx, test_state};

    #[tokio::test]
    async fn blacklist_add_then_del_round_trip() {
        let (state, _mock) = test_state();
        let mut ctx = group_ctx("g1", "admin@s.whatsapp.net");
        ctx.args = vec!["add".into(), "123".into()];

        blacklist_command(ctx.clone(), state.clone()).await.unwrap();
        assert_eq!(
            state.store.group("g1").blacklist,
            vec!["123@s.whatsapp.net".to_string()]
        );

        ctx.args = vec!["del".into(), "123".into()];
        blacklist_command(ctx, state.clone()).await.unwrap();
        assert!(state.store.group("g1").blacklist.is_empty());
    }

    #[tokio::test]
    async fn banword_lowercases_and_deduplicates() {
        let (state, mock) = test_state();
        let mut ctx = group_ctx("g1", "admin@s.whatsapp.net");
        ctx.args = vec!["SCAM".into()];

        banword_command(ctx.clone(), state.clone()).await.unwrap();
        assert_eq!(state.store.group("g1").bannedwords, vec!["scam".to_string()]);

        banword_command(ctx, state.clone()).await.unwrap();
        assert_eq!(state.store.group("g1").bannedwords.len(), 1);
        assert!(mock.last_message().unwrap().text.starts_with("ℹ️"));
    }

    #[tokio::test]
    async fn lists_do_not_clobber_each_other() {
        let (state, _mock) = test_state();

        let mut ctx = group_ctx("g1", "admin@s.whatsapp.net");
        ctx.args = vec!["spam".into()];
        banword_command(ctx, state.clone()).await.unwrap();

        let mut ctx = group_ctx("g1", "admin@s.whatsapp.net");
        ctx.mentions = vec!["u1@s.whatsapp.net".into()];
        muteuser_command(ctx, state.clone()).await.unwrap();

        let record = state.store.group("g1");
        assert_eq!(record.bannedwords, vec!["spam".to_string()]);
        assert_eq!(record.mutedusers, vec!["u1@s.whatsapp.net".to_string()]);
    }
}

//! Thin admin passthrough commands: each one maps a command to a single
//! transport call and translates the error taxonomy into a reply.

use crate::bot::dispatcher::{AppState, CommandCtx, CommandRegistry, CommandSpec, wrap};
use crate::transport::{ParticipantAction, TransportError};
use crate::utils::mention;

fn describe(err: &TransportError) -> String {
    match err {
        TransportError::RateLimited => {
            "⏳ The platform is rate limiting us, try again in a moment.".into()
        }
        TransportError::NotAuthorized => "❌ I am not allowed to do that here.".into(),
        TransportError::Other(raw) => format!("⚠️ The platform refused: {raw}"),
    }
}

async fn change_members(
    ctx: CommandCtx,
    state: AppState,
    action: ParticipantAction,
    done: &str,
) -> anyhow::Result<()> {
    let targets: Vec<String> = if ctx.mentions.is_empty() {
        ctx.target().into_iter().collect()
    } else {
        ctx.mentions.clone()
    };
    if targets.is_empty() {
        ctx.reply(&state, "❌ Mention or name at least one member.").await?;
        return Ok(());
    }

    match state
        .transport
        .update_participants(&ctx.chat, &targets, action)
        .await
    {
        Ok(()) => {
            let listed: Vec<String> = targets.iter().map(|t| mention(t)).collect();
            ctx.reply_mentions(&state, &format!("✅ {} {}.", done, listed.join(", ")), &targets)
                .await
        }
        Err(err) => ctx.reply(&state, &describe(&err)).await,
    }
}

async fn kick_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    change_members(ctx, state, ParticipantAction::Remove, "Removed").await
}

async fn add_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    change_members(ctx, state, ParticipantAction::Add, "Added").await
}

async fn promote_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    change_members(ctx, state, ParticipantAction::Promote, "Promoted").await
}

async fn demote_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    change_members(ctx, state, ParticipantAction::Demote, "Demoted").await
}

async fn invite_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    match state.transport.invite_code(&ctx.chat).await {
        Ok(code) => {
            ctx.reply(&state, &format!("🔗 https://chat.whatsapp.com/{code}")).await
        }
        Err(err) => ctx.reply(&state, &describe(&err)).await,
    }
}

async fn setsubject_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let subject = ctx.args_joined(0);
    if subject.is_empty() {
        ctx.reply(&state, "❌ Usage: setsubject <new name>").await?;
        return Ok(());
    }
    match state.transport.set_subject(&ctx.chat, &subject).await {
        Ok(()) => ctx.reply(&state, "✅ Group name updated.").await,
        Err(err) => ctx.reply(&state, &describe(&err)).await,
    }
}

async fn setdesc_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let desc = ctx.args_joined(0);
    if desc.is_empty() {
        ctx.reply(&state, "❌ Usage: setdesc <new description>").await?;
        return Ok(());
    }
    match state.transport.set_description(&ctx.chat, &desc).await {
        Ok(()) => ctx.reply(&state, "✅ Group description updated.").await,
        Err(err) => ctx.reply(&state, &describe(&err)).await,
    }
}

async fn group_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let locked = match ctx.arg(0) {
        Some("close") => true,
        Some("open") => false,
        _ => {
            ctx.reply(&state, "❌ Usage: group open|close").await?;
            return Ok(());
        }
    };
    match state.transport.set_locked(&ctx.chat, locked).await {
        Ok(()) if locked => ctx.reply(&state, "🔒 Group closed, only admins can send.").await,
        Ok(()) => ctx.reply(&state, "🔓 Group opened for everyone.").await,
        Err(err) => ctx.reply(&state, &describe(&err)).await,
    }
}

async fn resetgroup_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    if ctx.arg(0) != Some("confirm") {
        ctx.reply(&state, "⚠️ This wipes every stored setting for this group. Run `resetgroup confirm` to proceed.")
            .await?;
        return Ok(());
    }
    if state.store.wipe(&ctx.chat) {
        ctx.reply(&state, "🧹 Group settings wiped.").await
    } else {
        ctx.reply(&state, "ℹ️ Nothing stored for this group.").await
    }
}

pub fn register(reg: &mut CommandRegistry) {
    reg.register(
        CommandSpec::admin("kick", &[], "admin", "Remove members", wrap(kick_command))
            .needs_bot_admin(),
    );
    reg.register(
        CommandSpec::admin("add", &[], "admin", "Add members", wrap(add_command))
            .needs_bot_admin(),
    );
    reg.register(
        CommandSpec::admin("promote", &[], "admin", "Promote to admin", wrap(promote_command))
            .needs_bot_admin(),
    );
    reg.register(
        CommandSpec::admin("demote", &[], "admin", "Demote an admin", wrap(demote_command))
            .needs_bot_admin(),
    );
    reg.register(
        CommandSpec::admin("invite", &["link"], "admin", "Get the invite link", wrap(invite_command))
            .needs_bot_admin(),
    );
    reg.register(
        CommandSpec::admin("setsubject", &["setname"], "admin", "Rename the group", wrap(setsubject_command))
            .needs_bot_admin(),
    );
    reg.register(
        CommandSpec::admin("setdesc", &[], "admin", "Set the group description", wrap(setdesc_command))
            .needs_bot_admin(),
    );
    reg.register(
        CommandSpec::admin("group", &[], "admin", "Open or close the group", wrap(group_command))
            .needs_bot_admin(),
    );
    reg.register(CommandSpec::admin(
        "resetgroup",
        &[],
        "admin",
        "Wipe all stored settings for this group",
        wrap(resetgroup_command),
    ));
}

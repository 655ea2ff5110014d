//! Event handlers for plain (non-command) traffic.
//!
//! Every group message that is not a command runs through this pipeline in
//! order; the first stage that consumes the message stops the rest.

pub mod antilink;
pub mod filters;
pub mod flood;
pub mod members;

pub use flood::FloodTracker;

use crate::bot::dispatcher::{AppState, CommandCtx, IncomingMessage};

/// Run the plain-message pipeline for one group message.
pub async fn on_group_message(
    state: &AppState,
    msg: &IncomingMessage,
    ctx: &CommandCtx,
) -> anyhow::Result<()> {
    if filters::check_muted(state, msg, ctx).await? {
        return Ok(());
    }
    if antilink::check(state, msg, ctx).await? {
        return Ok(());
    }
    if filters::check_banned_words(state, msg, ctx).await? {
        return Ok(());
    }
    if filters::check_media_locks(state, msg, ctx).await? {
        return Ok(());
    }
    if flood::check(state, msg, ctx).await? {
        return Ok(());
    }
    filters::check_quiz_answer(state, msg, ctx).await?;
    Ok(())
}

//! Core bot plumbing: shared state, command dispatch and the bridge webhook.

pub mod dispatcher;
pub mod webhook;

pub use dispatcher::{AppState, CommandCtx, CommandRegistry, CommandSpec, IncomingMessage};

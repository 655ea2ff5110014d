//! Command registry and dispatch.
//!
//! Plugins register handlers by name, aliases, category and description; the
//! registry resolves an incoming prefixed message to a handler and enforces
//! the declarative permission flags before the handler runs. Handler errors
//! never propagate past dispatch: anything unexpected becomes a generic
//! error reply.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error};

use crate::config::Config;
use crate::events::FloodTracker;
use crate::store::{AntiLinkStore, GroupStore};
use crate::transport::Transport;

/// Media attachment kinds the lock flags gate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
    Sticker,
}

/// One inbound message as delivered by the bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub id: String,
    /// Chat JID: the group JID for group messages, the sender JID otherwise.
    pub chat: String,
    pub sender: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub media: Option<MediaKind>,
    #[serde(default)]
    pub is_group: bool,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Per-group moderation records.
    pub store: Arc<GroupStore>,
    /// Time-windowed anti-link warnings.
    pub antilink: Arc<AntiLinkStore>,
    pub transport: Arc<dyn Transport>,
    /// In-memory flood tracker.
    pub flood: FloodTracker,
    pub registry: Arc<CommandRegistry>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<GroupStore>,
        antilink: Arc<AntiLinkStore>,
        transport: Arc<dyn Transport>,
        registry: Arc<CommandRegistry>,
    ) -> Self {
        Self {
            config,
            store,
            antilink,
            transport,
            flood: FloodTracker::new(),
            registry,
        }
    }

    /// Check if a JID is a bot owner.
    pub fn is_owner(&self, jid: &str) -> bool {
        self.config.owner_jids.iter().any(|o| o == jid)
    }
}

/// Context handed to every command handler.
#[derive(Debug, Clone)]
pub struct CommandCtx {
    /// Chat the command arrived in.
    pub chat: String,
    pub sender: String,
    pub message_id: String,
    /// Whitespace-split arguments after the command name.
    pub args: Vec<String>,
    /// JIDs mentioned in the command message.
    pub mentions: Vec<String>,
    pub is_group: bool,
    pub is_sender_admin: bool,
    pub is_bot_admin: bool,
}

impl CommandCtx {
    pub fn arg(&self, idx: usize) -> Option<&str> {
        self.args.get(idx).map(String::as_str)
    }

    pub fn args_joined(&self, from: usize) -> String {
        self.args[from.min(self.args.len())..].join(" ")
    }

    /// Target member: first mention, else first argument read as a JID.
    pub fn target(&self) -> Option<String> {
        self.target_after(0)
    }

    /// Like [`Self::target`], but falling back to the argument at `idx` for
    /// commands shaped like `blacklist add <member>`.
    pub fn target_after(&self, idx: usize) -> Option<String> {
        if let Some(m) = self.mentions.first() {
            return Some(m.clone());
        }
        self.arg(idx).map(|a| {
            let digits = a.trim_start_matches('@');
            if digits.contains('@') {
                digits.to_string()
            } else {
                format!("{digits}@s.whatsapp.net")
            }
        })
    }

    pub async fn reply(&self, state: &AppState, text: &str) -> anyhow::Result<()> {
        state.transport.send_message(&self.chat, text, &[]).await?;
        Ok(())
    }

    pub async fn reply_mentions(
        &self,
        state: &AppState,
        text: &str,
        mentions: &[String],
    ) -> anyhow::Result<()> {
        state.transport.send_message(&self.chat, text, mentions).await?;
        Ok(())
    }
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
pub type Handler = Arc<dyn Fn(CommandCtx, AppState) -> HandlerFuture + Send + Sync>;

/// Wrap an `async fn(CommandCtx, AppState) -> anyhow::Result<()>` as a handler.
pub fn wrap<F, Fut>(f: F) -> Handler
where
    F: Fn(CommandCtx, AppState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctx, state| Box::pin(f(ctx, state)))
}

/// Declarative command metadata plus its handler.
#[derive(Clone)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub category: &'static str,
    pub description: &'static str,
    /// Only usable inside groups.
    pub group_only: bool,
    /// Only usable by group admins (or bot owners).
    pub admin_only: bool,
    /// Requires the bot itself to be a group admin.
    pub needs_bot_admin: bool,
    pub handler: Handler,
}

impl CommandSpec {
    /// A group-only, admin-only spec: the common case for moderation commands.
    pub fn admin(
        name: &'static str,
        aliases: &'static [&'static str],
        category: &'static str,
        description: &'static str,
        handler: Handler,
    ) -> Self {
        Self {
            name,
            aliases,
            category,
            description,
            group_only: true,
            admin_only: true,
            needs_bot_admin: false,
            handler,
        }
    }

    /// A group-only spec anyone can run.
    pub fn group(
        name: &'static str,
        aliases: &'static [&'static str],
        category: &'static str,
        description: &'static str,
        handler: Handler,
    ) -> Self {
        Self {
            name,
            aliases,
            category,
            description,
            group_only: true,
            admin_only: false,
            needs_bot_admin: false,
            handler,
        }
    }

    pub fn needs_bot_admin(mut self) -> Self {
        self.needs_bot_admin = true;
        self
    }
}

/// All registered commands, indexed by name and alias.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<CommandSpec>>,
    index: HashMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: CommandSpec) {
        let idx = self.commands.len();
        let spec = Arc::new(spec);
        self.index.insert(spec.name, idx);
        for &alias in spec.aliases {
            self.index.insert(alias, idx);
        }
        self.commands.push(spec);
    }

    pub fn find(&self, name: &str) -> Option<Arc<CommandSpec>> {
        self.index.get(name).map(|&idx| self.commands[idx].clone())
    }

    /// All commands in registration order, for menu rendering.
    pub fn all(&self) -> &[Arc<CommandSpec>] {
        &self.commands
    }
}

/// Resolve and run a prefixed command message.
///
/// Returns `true` when the message was consumed as a command (found or not),
/// so the caller can skip the plain-message pipeline.
pub async fn dispatch(state: &AppState, msg: &IncomingMessage, ctx: CommandCtx) -> bool {
    let Some(rest) = msg.text.strip_prefix(&state.config.command_prefix) else {
        return false;
    };

    let mut words = rest.split_whitespace();
    let Some(name) = words.next() else {
        return false;
    };
    let name = name.to_lowercase();

    let Some(spec) = state.registry.find(&name) else {
        debug!("Unknown command '{}' in {}", name, msg.chat);
        return false;
    };

    let mut ctx = ctx;
    ctx.args = words.map(str::to_string).collect();

    // A frozen group ignores everything except admins.
    if ctx.is_group && !ctx.is_sender_admin && state.store.group(&ctx.chat).frozen {
        return true;
    }

    if spec.group_only && !ctx.is_group {
        let _ = ctx.reply(state, "❌ This command only works in groups.").await;
        return true;
    }
    if spec.admin_only && !ctx.is_sender_admin && !state.is_owner(&ctx.sender) {
        let _ = ctx.reply(state, "❌ This command is for group admins only.").await;
        return true;
    }
    if spec.needs_bot_admin && !ctx.is_bot_admin {
        let _ = ctx
            .reply(state, "❌ I need to be a group admin to do that.")
            .await;
        return true;
    }

    if let Err(e) = (spec.handler)(ctx.clone(), state.clone()).await {
        error!("Command '{}' failed in {}: {:#}", name, msg.chat, e);
        let _ = ctx
            .reply(state, &format!("⚠️ An error occurred: {e}"))
            .await;
    }

    true
}

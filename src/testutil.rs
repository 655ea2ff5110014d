//! Shared fixtures for unit tests.

use std::sync::Arc;

use url::Url;

use crate::bot::dispatcher::{AppState, CommandCtx, IncomingMessage};
use crate::config::Config;
use crate::store::{AntiLinkStore, GroupStore};
use crate::store::testutil::temp_path;
use crate::transport::mock::MockTransport;

/// An `AppState` over temp-file stores and a recording transport.
pub(crate) fn test_state() -> (AppState, Arc<MockTransport>) {
    let config = Config {
        bridge_url: Url::parse("http://localhost:1/").unwrap(),
        bridge_token: None,
        webhook_port: 0,
        data_dir: std::env::temp_dir(),
        owner_jids: vec!["owner@s.whatsapp.net".to_string()],
        command_prefix: ".".to_string(),
        antilink_default: true,
    };

    let mock = Arc::new(MockTransport::new());
    let state = AppState::new(
        Arc::new(config),
        Arc::new(GroupStore::open(temp_path("state-groups"))),
        Arc::new(AntiLinkStore::open(temp_path("state-antilink"))),
        mock.clone(),
        Arc::new(crate::plugins::register_all()),
    );
    (state, mock)
}

/// A plain-member command context in a group.
pub(crate) fn group_ctx(chat: &str, sender: &str) -> CommandCtx {
    CommandCtx {
        chat: chat.to_string(),
        sender: sender.to_string(),
        message_id: "m1".to_string(),
        args: Vec::new(),
        mentions: Vec::new(),
        is_group: true,
        is_sender_admin: false,
        is_bot_admin: true,
    }
}

/// A group message containing a forbidden invite link.
pub(crate) fn link_message(chat: &str, sender: &str) -> IncomingMessage {
    message(chat, sender, "check https://chat.whatsapp.com/AbCdEf123456")
}

pub(crate) fn message(chat: &str, sender: &str, text: &str) -> IncomingMessage {
    IncomingMessage {
        id: "m1".to_string(),
        chat: chat.to_string(),
        sender: sender.to_string(),
        text: text.to_string(),
        mentions: Vec::new(),
        media: None,
        is_group: true,
    }
}

//! Messaging transport seam.
//!
//! Everything the bot does to the outside world goes through the [`Transport`]
//! trait: sending replies, deleting messages, reading group metadata and
//! updating participants. The production implementation talks to a WhatsApp
//! bridge over HTTP ([`bridge::BridgeClient`]); tests use [`mock::MockTransport`].

pub mod bridge;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One group member as reported by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub jid: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_superadmin: bool,
    /// Set by the bridge on the bot's own entry.
    #[serde(default)]
    pub is_me: bool,
}

/// Group metadata as reported by the bridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub owner: Option<String>,
    /// Group creation time (s epoch), when the platform reports it.
    #[serde(default)]
    pub creation: Option<i64>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl GroupInfo {
    /// Whether the JID is an admin (or superadmin) of this group.
    pub fn is_admin(&self, jid: &str) -> bool {
        self.participants
            .iter()
            .any(|p| p.jid == jid && (p.is_admin || p.is_superadmin))
    }

    /// Whether the bot's own entry is an admin.
    pub fn bot_is_admin(&self) -> bool {
        self.participants
            .iter()
            .any(|p| p.is_me && (p.is_admin || p.is_superadmin))
    }
}

/// Participant update actions supported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantAction {
    Add,
    Remove,
    Promote,
    Demote,
}

impl ParticipantAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Promote => "promote",
            Self::Demote => "demote",
        }
    }
}

/// Reference to a message, enough for the bridge to revoke it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRef {
    pub group_id: String,
    pub id: String,
    pub sender: String,
}

/// Transport failure taxonomy.
///
/// The bridge surfaces platform rejections as error strings; `classify` maps
/// the substrings the platform library uses onto the variants callers care
/// about. The substring matching is an interface convention of the platform
/// library, kept for compatibility.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("rate limited by the platform")]
    RateLimited,
    #[error("bot lacks permission for this action")]
    NotAuthorized,
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn classify(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("429") || lower.contains("rate-overlimit") {
            Self::RateLimited
        } else if lower.contains("not-authorized") || lower.contains("forbidden") {
            Self::NotAuthorized
        } else {
            Self::Other(raw.to_string())
        }
    }
}

/// Black-box messaging transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message; `mentions` lists JIDs highlighted in the text.
    async fn send_message(
        &self,
        to: &str,
        text: &str,
        mentions: &[String],
    ) -> Result<(), TransportError>;

    /// Revoke a message for everyone.
    async fn delete_message(&self, msg: &MessageRef) -> Result<(), TransportError>;

    async fn fetch_group_info(&self, group_id: &str) -> Result<GroupInfo, TransportError>;

    async fn update_participants(
        &self,
        group_id: &str,
        members: &[String],
        action: ParticipantAction,
    ) -> Result<(), TransportError>;

    async fn invite_code(&self, group_id: &str) -> Result<String, TransportError>;

    async fn set_subject(&self, group_id: &str, subject: &str) -> Result<(), TransportError>;

    async fn set_description(&self, group_id: &str, desc: &str) -> Result<(), TransportError>;

    /// Announcement mode: when locked, only admins can send.
    async fn set_locked(&self, group_id: &str, locked: bool) -> Result<(), TransportError>;
}

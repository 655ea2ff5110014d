//! Configuration module for the Warden bot.
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;

use url::Url;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the WhatsApp bridge REST API.
    pub bridge_url: Url,

    /// Optional bearer token for the bridge.
    pub bridge_token: Option<String>,

    /// Port the inbound event webhook listens on.
    pub webhook_port: u16,

    /// Directory holding the JSON store files.
    pub data_dir: PathBuf,

    /// Owner JIDs (comma-separated). Owners bypass all restrictions.
    pub owner_jids: Vec<String>,

    /// Command prefix, e.g. `.` or `!`.
    pub command_prefix: String,

    /// Global anti-link default for groups without a per-group override.
    pub antilink_default: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if required environment variables are not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bridge_url = env::var("BRIDGE_URL").expect("BRIDGE_URL must be set");
        let bridge_url = Url::parse(&bridge_url).expect("BRIDGE_URL must be a valid URL");

        let bridge_token = env::var("BRIDGE_TOKEN").ok().filter(|s| !s.is_empty());

        let webhook_port = env::var("WEBHOOK_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8090);

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let owner_jids = env::var("OWNER_JIDS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let command_prefix = env::var("COMMAND_PREFIX")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| ".".to_string());

        let antilink_default = env::var("ANTILINK_DEFAULT")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "on"))
            .unwrap_or(false);

        Self {
            bridge_url,
            bridge_token,
            webhook_port,
            data_dir,
            owner_jids,
            command_prefix,
            antilink_default,
        }
    }
}

//! Warden - WhatsApp group moderation bot
//!
//! Talks to a local bridge side-car over HTTP: inbound events arrive on an
//! axum webhook, outbound actions go out through a small REST client.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `store` - Per-group JSON file state
//! - `transport` - Bridge REST client behind a trait
//! - `bot` - Webhook server and command dispatch
//! - `plugins` - Command handlers (extensible)
//! - `events` - Plain-message and membership pipelines
//! - `utils` - Utility functions

mod bot;
mod config;
mod events;
mod plugins;
mod store;
#[cfg(test)]
mod testutil;
mod transport;
mod utils;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bot::dispatcher::AppState;
use config::Config;
use store::{AntiLinkStore, GroupStore};
use transport::bridge::BridgeClient;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warden=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Warden bot...");

    let config = Config::from_env();
    info!("Configuration loaded successfully");
    info!("Bridge endpoint: {}", config.bridge_url);

    let groups = Arc::new(GroupStore::open(config.data_dir.join("groups.json")));
    let antilink = Arc::new(AntiLinkStore::open(config.data_dir.join("antilink.json")));
    info!("State files ready under {}", config.data_dir.display());

    let transport = Arc::new(BridgeClient::new(
        config.bridge_url.clone(),
        config.bridge_token.clone(),
    ));

    if config.owner_jids.is_empty() {
        info!("No owner JIDs configured (OWNER_JIDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_jids);
    }

    let registry = Arc::new(plugins::register_all());
    info!("Registered {} commands", registry.all().len());

    let state = AppState::new(Arc::new(config), groups, antilink, transport, registry);

    bot::webhook::run(state).await
}

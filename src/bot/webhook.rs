//! Inbound event webhook.
//!
//! The bridge POSTs every event (messages, participant changes) to this axum
//! server as JSON. Each event is handled on its own task so a slow store or
//! bridge call never blocks the webhook.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::dispatcher::{self, AppState, CommandCtx, IncomingMessage};
use crate::events;
use crate::transport::ParticipantAction;

/// Everything the bridge can deliver.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    Message(IncomingMessage),
    GroupParticipants {
        group_id: String,
        members: Vec<String>,
        action: ParticipantAction,
        /// Who performed the update, when the platform reports it.
        #[serde(default)]
        actor: Option<String>,
    },
}

/// Run the webhook server until ctrl-c.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let port = state.config.webhook_port;
    let app = Router::new()
        .route("/events", post(handle_event))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("📡 Listening for bridge events on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn handle_event(
    State(state): State<AppState>,
    Json(event): Json<BridgeEvent>,
) -> StatusCode {
    tokio::spawn(async move {
        match event {
            BridgeEvent::Message(msg) => handle_message(state, msg).await,
            BridgeEvent::GroupParticipants {
                group_id,
                members,
                action,
                actor,
            } => {
                if let Err(e) =
                    events::members::handle(&state, &group_id, &members, action, actor.as_deref())
                        .await
                {
                    error!("Participant event failed in {}: {:#}", group_id, e);
                }
            }
        }
    });
    StatusCode::OK
}

async fn handle_message(state: AppState, msg: IncomingMessage) {
    // Never react to our own outbound messages echoed back.
    if msg.sender.is_empty() {
        return;
    }

    let (is_sender_admin, is_bot_admin) = if msg.is_group {
        match state.transport.fetch_group_info(&msg.chat).await {
            Ok(info) => (info.is_admin(&msg.sender), info.bot_is_admin()),
            Err(e) => {
                warn!("Could not fetch group info for {}: {}", msg.chat, e);
                (false, false)
            }
        }
    } else {
        (false, false)
    };

    let ctx = CommandCtx {
        chat: msg.chat.clone(),
        sender: msg.sender.clone(),
        message_id: msg.id.clone(),
        args: Vec::new(),
        mentions: msg.mentions.clone(),
        is_group: msg.is_group,
        is_sender_admin,
        is_bot_admin,
    };

    if dispatcher::dispatch(&state, &msg, ctx.clone()).await {
        return;
    }

    if msg.is_group
        && let Err(e) = events::on_group_message(&state, &msg, &ctx).await
    {
        error!("Message pipeline failed in {}: {:#}", msg.chat, e);
    }
}

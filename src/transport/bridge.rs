//! HTTP client for the WhatsApp bridge.
//!
//! The bridge is a side-car process that owns the actual WhatsApp session and
//! exposes a small REST surface; this client maps the [`Transport`] trait onto
//! it. Error bodies from the bridge carry the platform library's error
//! strings, which `TransportError::classify` folds into the taxonomy.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::{GroupInfo, MessageRef, ParticipantAction, Transport, TransportError};

/// REST client for the bridge.
pub struct BridgeClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl BridgeClient {
    pub fn new(base: Url, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base,
            token,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path)
            .map_err(|e| TransportError::Other(e.to_string()))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, TransportError> {
        let url = self.endpoint(path)?;
        let mut req = self.http.post(url).json(body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Self::check(resp).await
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, TransportError> {
        let url = self.endpoint(path)?;
        let mut req = self.http.get(url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Self::check(resp).await
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        debug!("Bridge call failed: {} {}", status, body);
        Err(TransportError::classify(&format!("{status} {body}")))
    }
}

#[async_trait]
impl Transport for BridgeClient {
    async fn send_message(
        &self,
        to: &str,
        text: &str,
        mentions: &[String],
    ) -> Result<(), TransportError> {
        self.post(
            "messages/send",
            &json!({ "to": to, "text": text, "mentions": mentions }),
        )
        .await?;
        Ok(())
    }

    async fn delete_message(&self, msg: &MessageRef) -> Result<(), TransportError> {
        self.post("messages/delete", msg).await?;
        Ok(())
    }

    async fn fetch_group_info(&self, group_id: &str) -> Result<GroupInfo, TransportError> {
        let resp = self.get(&format!("groups/{group_id}")).await?;
        resp.json::<GroupInfo>()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))
    }

    async fn update_participants(
        &self,
        group_id: &str,
        members: &[String],
        action: ParticipantAction,
    ) -> Result<(), TransportError> {
        self.post(
            &format!("groups/{group_id}/participants"),
            &json!({ "action": action.as_str(), "members": members }),
        )
        .await?;
        Ok(())
    }

    async fn invite_code(&self, group_id: &str) -> Result<String, TransportError> {
        let resp = self.get(&format!("groups/{group_id}/invite")).await?;
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        body.get("code")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| TransportError::Other("bridge returned no invite code".into()))
    }

    async fn set_subject(&self, group_id: &str, subject: &str) -> Result<(), TransportError> {
        self.post(
            &format!("groups/{group_id}/subject"),
            &json!({ "subject": subject }),
        )
        .await?;
        Ok(())
    }

    async fn set_description(&self, group_id: &str, desc: &str) -> Result<(), TransportError> {
        self.post(
            &format!("groups/{group_id}/description"),
            &json!({ "description": desc }),
        )
        .await?;
        Ok(())
    }

    async fn set_locked(&self, group_id: &str, locked: bool) -> Result<(), TransportError> {
        self.post(
            &format!("groups/{group_id}/settings"),
            &json!({ "announce": locked }),
        )
        .await?;
        Ok(())
    }
}

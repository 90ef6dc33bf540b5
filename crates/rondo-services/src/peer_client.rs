//! Outbound peer calls.
//!
//! All four peer-to-peer RPCs go through this client: register, relay,
//! reconfigure, unregister. Every request carries a bounded timeout so no
//! protocol operation can block indefinitely on a dead peer. Protocol-level
//! retry policy (the relay fallback to the origin) lives in the relay
//! engine, not here.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::time::Duration;
use uuid::Uuid;

use rondo_core::chain::{HopSignature, SignatureChain};
use rondo_core::wire::{RegisterResponse, TIMESTAMP_HEADER};

use crate::node::NodeIdentity;

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("peer returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

pub struct PeerClient {
    http: reqwest::Client,
    request_timeout: Duration,
}

impl PeerClient {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            request_timeout,
        }
    }

    /// POST /register-node on the origin. Both 200 (new member) and
    /// 202 (idempotent re-join) parse as success.
    pub async fn register(
        &self,
        host: &str,
        port: u16,
        me: &NodeIdentity,
    ) -> Result<RegisterResponse, PeerError> {
        let response = self
            .http
            .post(format!("http://{host}:{port}/register-node"))
            .timeout(self.request_timeout)
            .query(&[
                ("host", me.host.clone()),
                ("port", me.port.to_string()),
                ("uuid", me.uuid.to_string()),
                ("salt", me.salt.clone()),
                ("name", me.name.clone()),
            ])
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// POST /relay on a peer: multipart parts `message` (payload under its
    /// original content type) and `signatures` (chain as JSON), logical
    /// timestamp in the `X-Game-Timestamp` header.
    pub async fn relay(
        &self,
        host: &str,
        port: u16,
        content: Bytes,
        content_type: &str,
        chain: &SignatureChain,
        timestamp: u64,
    ) -> Result<HopSignature, PeerError> {
        let message = Part::bytes(content.to_vec()).mime_str(content_type)?;
        let signatures =
            Part::text(serde_json::to_string(chain)?).mime_str("application/json")?;
        let form = Form::new()
            .part("message", message)
            .part("signatures", signatures);

        let response = self
            .http
            .post(format!("http://{host}:{port}/relay"))
            .timeout(self.request_timeout)
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// POST /reconfigure on a peer, instructing it to adopt a new successor
    /// from `activates_at` onward. Authenticated as the target's own
    /// identity, which only the origin's registry knows.
    pub async fn reconfigure(
        &self,
        host: &str,
        port: u16,
        uuid: Uuid,
        salt: &str,
        next_host: &str,
        next_port: u16,
        activates_at: u64,
    ) -> Result<(), PeerError> {
        let response = self
            .http
            .post(format!("http://{host}:{port}/reconfigure"))
            .timeout(self.request_timeout)
            .query(&[
                ("uuid", uuid.to_string()),
                ("salt", salt.to_string()),
                ("nextHost", next_host.to_string()),
                ("nextPort", next_port.to_string()),
                ("xGameTimestamp", activates_at.to_string()),
            ])
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// POST /unregister-node on the origin.
    pub async fn unregister(
        &self,
        host: &str,
        port: u16,
        uuid: Uuid,
        salt: &str,
    ) -> Result<(), PeerError> {
        let response = self
            .http
            .post(format!("http://{host}:{port}/unregister-node"))
            .timeout(self.request_timeout)
            .query(&[("uuid", uuid.to_string()), ("salt", salt.to_string())])
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PeerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PeerError::Status { status, body })
}

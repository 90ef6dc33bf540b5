//! HTTP API handlers — the ring protocol's RPC surface.
//!
//! Thin translation layer: extract, call into [`RingNode`], map
//! [`RingError`] to a status code. No protocol logic lives here.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use rondo_core::chain::{HopSignature, SignatureChain};
use rondo_core::wire::{RegisterResponse, RoundTripResult, TIMESTAMP_HEADER};
use rondo_core::RingError;
use rondo_services::{NodeStatus, RingNode};

// ── Error mapping ─────────────────────────────────────────────────────────────

pub struct ApiError(RingError);

impl From<RingError> for ApiError {
    fn from(err: RingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RingError::InvalidInput(_) | RingError::Closed => StatusCode::BAD_REQUEST,
            RingError::NotFound(_) => StatusCode::NOT_FOUND,
            RingError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RingError::TimedOut => StatusCode::GATEWAY_TIMEOUT,
        };
        (status, self.0.to_string()).into_response()
    }
}

fn bad_request(msg: &str) -> ApiError {
    ApiError(RingError::InvalidInput(msg.to_string()))
}

// ── /register-node ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterParams {
    pub host: String,
    pub port: u16,
    pub uuid: Uuid,
    pub salt: String,
    pub name: String,
}

pub async fn handle_register(
    State(node): State<Arc<RingNode>>,
    Query(params): Query<RegisterParams>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let (response, already_member) = node
        .join(
            &params.host,
            params.port,
            params.uuid,
            &params.name,
            &params.salt,
        )
        .await?;
    let status = if already_member {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(response)))
}

// ── /relay ────────────────────────────────────────────────────────────────────

pub async fn handle_relay(
    State(node): State<Arc<RingNode>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<HopSignature>, ApiError> {
    let timestamp: u64 = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| bad_request("missing or invalid X-Game-Timestamp header"))?;

    let mut content: Option<Bytes> = None;
    let mut content_type = String::from("application/octet-stream");
    let mut chain: Option<SignatureChain> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("message") => {
                if let Some(ct) = field.content_type() {
                    content_type = ct.to_string();
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(&format!("could not read message part: {e}")))?;
                content = Some(data);
            }
            Some("signatures") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(&format!("could not read signatures part: {e}")))?;
                let parsed = serde_json::from_slice(&data)
                    .map_err(|e| bad_request(&format!("invalid signature chain: {e}")))?;
                chain = Some(parsed);
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| bad_request("missing message part"))?;
    let chain = chain.unwrap_or_default();

    let signature = node.relay(content, &content_type, chain, timestamp).await?;
    Ok(Json(signature))
}

// ── /play ─────────────────────────────────────────────────────────────────────

pub async fn handle_play(
    State(node): State<Arc<RingNode>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RoundTripResult>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/plain")
        .to_string();
    let result = node.send_round_trip(body, &content_type).await?;
    Ok(Json(result))
}

// ── /reconfigure ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ReconfigureParams {
    pub uuid: Uuid,
    pub salt: String,
    #[serde(rename = "nextHost")]
    pub next_host: String,
    #[serde(rename = "nextPort")]
    pub next_port: u16,
    #[serde(rename = "xGameTimestamp")]
    pub x_game_timestamp: u64,
}

pub async fn handle_reconfigure(
    State(node): State<Arc<RingNode>>,
    Query(params): Query<ReconfigureParams>,
) -> Result<String, ApiError> {
    let confirmation = node
        .reconfigure(
            params.uuid,
            &params.salt,
            &params.next_host,
            params.next_port,
            params.x_game_timestamp,
        )
        .await?;
    Ok(confirmation)
}

// ── /unregister-node ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UnregisterParams {
    pub uuid: Uuid,
    pub salt: String,
}

pub async fn handle_unregister(
    State(node): State<Arc<RingNode>>,
    Query(params): Query<UnregisterParams>,
) -> Result<String, ApiError> {
    node.leave(params.uuid, &params.salt).await?;
    Ok("Unregister Successful".to_string())
}

// ── /status ───────────────────────────────────────────────────────────────────

pub async fn handle_status(State(node): State<Arc<RingNode>>) -> Json<NodeStatus> {
    Json(node.status().await)
}

//! Shared harness: loopback ring nodes and misbehaving stub members.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use tokio::task::JoinHandle;
use uuid::Uuid;

use rondo_core::chain::{HopSignature, SignatureChain};
use rondo_core::config::RondoConfig;
use rondo_core::crypto;
use rondo_core::wire::{RegisterResponse, TIMESTAMP_HEADER};
use rondo_services::{PeerClient, RingNode};

// ── Real nodes ────────────────────────────────────────────────────────────────

pub struct TestNode {
    pub node: Arc<RingNode>,
    pub addr: SocketAddr,
    server: JoinHandle<()>,
}

impl TestNode {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn spawn(mut config: RondoConfig) -> Result<TestNode> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind loopback listener")?;
    let addr = listener.local_addr()?;
    config.node.host = "127.0.0.1".into();
    config.node.port = addr.port();

    let node = Arc::new(RingNode::new(&config));
    let app = rondo_api::router(node.clone());
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });

    Ok(TestNode { node, addr, server })
}

/// Spawn a ring origin: no registrar, so it never registers outward.
pub async fn spawn_origin(name: &str, timeout_secs: u64, max_timeouts: u32) -> Result<TestNode> {
    let mut config = RondoConfig::default();
    config.node.name = name.into();
    config.relay.timeout_secs = timeout_secs;
    config.relay.max_timeouts = max_timeouts;
    spawn(config).await
}

/// Spawn a member and register it with the origin, as rondod does at
/// startup.
pub async fn spawn_member(name: &str, origin: &TestNode) -> Result<TestNode> {
    let mut config = RondoConfig::default();
    config.node.name = name.into();
    config.registrar.host = "127.0.0.1".into();
    config.registrar.port = origin.addr.port();
    let member = spawn(config).await?;
    member.node.register_with_origin().await?;
    Ok(member)
}

// ── Misbehaving stub members ──────────────────────────────────────────────────

/// What a stub does with an inbound relay.
#[derive(Clone, Copy)]
pub enum Behavior {
    /// Acknowledge the hop and never forward. The round trip dies here.
    Blackhole,
    /// Forward altered content (correctly signed) to the successor.
    Tamper,
    /// Forward the original content but without appending a signature.
    DropSignature,
}

pub struct StubMember {
    pub uuid: Uuid,
    pub salt: String,
    pub addr: SocketAddr,
    server: JoinHandle<()>,
}

impl Drop for StubMember {
    fn drop(&mut self) {
        self.server.abort();
    }
}

struct StubState {
    behavior: Behavior,
    name: String,
    salt: String,
    next_host: String,
    next_port: u16,
    client: PeerClient,
}

/// Register a stub with the origin and start serving its `/relay`.
pub async fn spawn_stub(name: &str, behavior: Behavior, origin: &TestNode) -> Result<StubMember> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let uuid = Uuid::new_v4();
    let salt = crypto::generate_salt();

    let port = addr.port().to_string();
    let uuid_param = uuid.to_string();
    let response = reqwest::Client::new()
        .post(origin.url("/register-node"))
        .query(&[
            ("host", "127.0.0.1"),
            ("port", port.as_str()),
            ("uuid", uuid_param.as_str()),
            ("salt", salt.as_str()),
            ("name", name),
        ])
        .send()
        .await?
        .error_for_status()
        .context("stub registration rejected")?;
    let pointer: RegisterResponse = response.json().await?;

    let state = Arc::new(StubState {
        behavior,
        name: name.to_string(),
        salt: salt.clone(),
        next_host: pointer.next_host,
        next_port: pointer.next_port,
        client: PeerClient::new(Duration::from_secs(5)),
    });
    let app = Router::new()
        .route("/relay", post(stub_relay))
        .with_state(state);
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server failed");
    });

    Ok(StubMember {
        uuid,
        salt,
        addr,
        server,
    })
}

async fn stub_relay(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Json<HopSignature> {
    let timestamp: u64 = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("stub relay requires a timestamp header");

    let mut content = Bytes::new();
    let mut content_type = String::from("text/plain");
    let mut chain = SignatureChain::default();
    while let Some(field) = multipart.next_field().await.expect("multipart") {
        match field.name() {
            Some("message") => {
                if let Some(ct) = field.content_type() {
                    content_type = ct.to_string();
                }
                content = field.bytes().await.expect("message part");
            }
            Some("signatures") => {
                chain = serde_json::from_slice(&field.bytes().await.expect("signatures part"))
                    .expect("chain json");
            }
            _ => {}
        }
    }

    let sign = |data: &[u8]| HopSignature {
        name: stub.name.clone(),
        hash: crypto::salted_hash(data, &stub.salt).expect("stub salt is valid"),
        content_type: content_type.clone(),
        content_length: data.len(),
    };

    match stub.behavior {
        Behavior::Blackhole => Json(sign(&content)),
        Behavior::Tamper => {
            let altered = Bytes::from_static(b"tampered payload");
            let signature = sign(&altered);
            let mut forwarded = chain;
            forwarded.push(signature.clone());
            stub.client
                .relay(
                    &stub.next_host,
                    stub.next_port,
                    altered,
                    &content_type,
                    &forwarded,
                    timestamp,
                )
                .await
                .expect("tamper forward failed");
            Json(signature)
        }
        Behavior::DropSignature => {
            let signature = sign(&content);
            stub.client
                .relay(
                    &stub.next_host,
                    stub.next_port,
                    content,
                    &content_type,
                    &chain,
                    timestamp,
                )
                .await
                .expect("drop-signature forward failed");
            Json(signature)
        }
    }
}

// ── HTTP helpers ──────────────────────────────────────────────────────────────

/// POST /play on the origin with a plain-text body.
pub async fn play(origin: &TestNode, text: &str) -> Result<reqwest::Response> {
    Ok(reqwest::Client::new()
        .post(origin.url("/play"))
        .header("Content-Type", "text/plain")
        .body(text.to_string())
        .send()
        .await?)
}

/// POST /relay directly to a node, the way a peer would.
pub async fn relay_to(
    addr: &SocketAddr,
    content: &'static [u8],
    chain: &SignatureChain,
    timestamp: u64,
) -> Result<reqwest::Response> {
    let form = reqwest::multipart::Form::new()
        .part(
            "message",
            reqwest::multipart::Part::bytes(content).mime_str("text/plain")?,
        )
        .part(
            "signatures",
            reqwest::multipart::Part::text(serde_json::to_string(chain)?)
                .mime_str("application/json")?,
        );
    Ok(reqwest::Client::new()
        .post(format!("http://{}/relay", addr))
        .header(TIMESTAMP_HEADER, timestamp.to_string())
        .multipart(form)
        .send()
        .await?)
}

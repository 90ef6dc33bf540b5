//! Per-process node state.
//!
//! All mutable protocol state lives behind a single coarse lock: the member
//! list (origin only), the current and pending successor pointers, the
//! last-seen logical timestamp, the ring clock, the timeout budget, and the
//! single pending round-trip slot. Operations hold the lock only for short
//! bookkeeping; no outbound call is ever made while it is held.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{oneshot, Mutex};
use uuid::Uuid;

use rondo_core::config::RondoConfig;
use rondo_core::wire::{RegisterResponse, RoundTripResult};
use rondo_core::{crypto, RingError};

use crate::peer_client::PeerClient;

/// A registered ring member as the origin's registry sees it.
#[derive(Debug, Clone)]
pub struct Peer {
    pub host: String,
    pub port: u16,
    pub uuid: Uuid,
    pub name: String,
    pub salt: String,
}

impl Peer {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// This process's own identity within the ring.
#[derive(Debug, Clone)]
pub struct NodeIdentity {
    pub uuid: Uuid,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub salt: String,
}

/// Live successor pointer — where this node forwards relays.
#[derive(Debug, Clone)]
pub(crate) struct Successor {
    pub host: String,
    pub port: u16,
}

/// A successor change staged by `/reconfigure`, applied only once a relay
/// carries a timestamp at or past `activates_at`.
#[derive(Debug, Clone)]
pub(crate) struct PendingSuccessor {
    pub host: String,
    pub port: u16,
    pub activates_at: u64,
}

/// The single round-trip slot plus the rendezvous back to the coordinator.
pub(crate) struct PendingRoundTrip {
    pub result: RoundTripResult,
    pub notify: oneshot::Sender<RoundTripResult>,
}

/// State guarded by the node lock.
pub(crate) struct NodeInner {
    /// Membership in join order, index 0 = the origin itself.
    /// Empty everywhere except at the origin.
    pub members: Vec<Peer>,
    pub successor: Option<Successor>,
    pub pending_successor: Option<PendingSuccessor>,
    /// Highest logical timestamp this node has processed.
    pub last_seen: u64,
    /// Ring-wide clock, advanced by the origin on each completed round trip.
    pub clock: u64,
    /// Cumulative timeout count toward the circuit breaker.
    pub timeouts: u32,
    pub pending: Option<PendingRoundTrip>,
}

impl NodeInner {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            successor: None,
            pending_successor: None,
            last_seen: 0,
            clock: 0,
            timeouts: 0,
            pending: None,
        }
    }

    /// Promote the staged successor once the relay sequence reaches its
    /// activation point. The swap is a plain pointer assignment — relays
    /// below the threshold keep the old pointer untouched.
    pub fn promote_pending_successor(&mut self, timestamp: u64) {
        let due = self
            .pending_successor
            .as_ref()
            .is_some_and(|p| timestamp >= p.activates_at);
        if due {
            let staged = self.pending_successor.take().unwrap();
            self.last_seen = self.last_seen.max(staged.activates_at);
            self.successor = Some(Successor {
                host: staged.host,
                port: staged.port,
            });
        }
    }
}

/// One ring member. Constructed once at process start and shared with every
/// request handler.
pub struct RingNode {
    pub(crate) identity: NodeIdentity,
    /// Round-trip wait window; also the `timeout` echoed in join responses.
    pub(crate) relay_timeout: Duration,
    pub(crate) max_timeouts: u32,
    /// Origin address this node registered with; `None` at the origin itself.
    pub(crate) registrar: Option<(String, u16)>,
    pub(crate) client: PeerClient,
    pub(crate) inner: Mutex<NodeInner>,
}

impl RingNode {
    /// Build a node from config, generating a fresh identity and salt.
    pub fn new(config: &RondoConfig) -> Self {
        let identity = NodeIdentity {
            uuid: Uuid::new_v4(),
            name: config.node.name.clone(),
            host: config.node.host.clone(),
            port: config.node.port,
            salt: crypto::generate_salt(),
        };
        let relay_timeout = Duration::from_secs(config.relay.timeout_secs);
        let registrar = config
            .registrar
            .is_configured()
            .then(|| (config.registrar.host.clone(), config.registrar.port));
        Self {
            identity,
            relay_timeout,
            max_timeouts: config.relay.max_timeouts,
            registrar,
            client: PeerClient::new(relay_timeout),
            inner: Mutex::new(NodeInner::new()),
        }
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// This node as a registry entry.
    pub(crate) fn self_peer(&self) -> Peer {
        Peer {
            host: self.identity.host.clone(),
            port: self.identity.port,
            uuid: self.identity.uuid,
            name: self.identity.name.clone(),
            salt: self.identity.salt.clone(),
        }
    }

    /// Register with the configured origin. Called once at startup; a
    /// failure here is fatal to the process — a member cannot operate
    /// without a successor pointer.
    pub async fn register_with_origin(&self) -> Result<RegisterResponse, RingError> {
        let (host, port) = self
            .registrar
            .clone()
            .ok_or_else(|| RingError::InvalidInput("no registrar configured".into()))?;
        let response = self
            .client
            .register(&host, port, &self.identity)
            .await
            .map_err(|e| {
                RingError::Unavailable(format!("could not register with {host}:{port}: {e}"))
            })?;

        let mut inner = self.inner.lock().await;
        inner.successor = Some(Successor {
            host: response.next_host.clone(),
            port: response.next_port,
        });
        inner.last_seen = response.x_game_timestamp;
        tracing::info!(
            next = %format!("{}:{}", response.next_host, response.next_port),
            timestamp = response.x_game_timestamp,
            "joined ring"
        );
        Ok(response)
    }

    /// Best-effort departure notification on shutdown. Never blocks the
    /// shutdown path: an unreachable origin is logged and forgotten.
    pub async fn leave_ring(&self) {
        let Some((host, port)) = self.registrar.clone() else {
            return;
        };
        match self
            .client
            .unregister(&host, port, self.identity.uuid, &self.identity.salt)
            .await
        {
            Ok(()) => tracing::info!("unregistered from ring"),
            Err(e) => tracing::warn!(error = %e, "could not unregister on shutdown"),
        }
    }

    /// Snapshot for `/status`.
    pub async fn status(&self) -> NodeStatus {
        let inner = self.inner.lock().await;
        let role = if self.registrar.is_some() {
            "member"
        } else {
            "origin"
        };
        NodeStatus {
            name: self.identity.name.clone(),
            uuid: self.identity.uuid,
            host: self.identity.host.clone(),
            port: self.identity.port,
            role: role.to_string(),
            successor: inner
                .successor
                .as_ref()
                .map(|s| format!("{}:{}", s.host, s.port)),
            members: inner.members.len(),
            clock: inner.clock,
            last_seen_timestamp: inner.last_seen,
            timeouts: inner.timeouts,
            round_trip_pending: inner.pending.is_some(),
        }
    }

    #[cfg(test)]
    pub(crate) async fn force_last_seen(&self, timestamp: u64) {
        self.inner.lock().await.last_seen = timestamp;
    }
}

/// Point-in-time view of a node, serialized by `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct NodeStatus {
    pub name: String,
    pub uuid: Uuid,
    pub host: String,
    pub port: u16,
    pub role: String,
    pub successor: Option<String>,
    pub members: usize,
    pub clock: u64,
    pub last_seen_timestamp: u64,
    pub timeouts: u32,
    pub round_trip_pending: bool,
}

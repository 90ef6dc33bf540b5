//! Ring membership registry — origin-only operations.
//!
//! The member list is kept in join order with the origin at index 0. Relay
//! order runs the other way: the newest member points backward at the
//! previously-newest one, and the very first joiner points at the origin.
//! Following the successor pointers from any member therefore walks every
//! live member exactly once and ends back at the origin — a single cycle.

use uuid::Uuid;

use rondo_core::wire::RegisterResponse;
use rondo_core::{crypto, RingError};

use crate::node::{Peer, RingNode};

impl RingNode {
    /// Handle a member joining (or re-joining) the ring.
    ///
    /// Returns the successor pointer for the caller plus a flag marking an
    /// idempotent re-join (same uuid, same salt), which the API reports as
    /// 202 instead of 200. A re-join with a different salt is rejected.
    pub async fn join(
        &self,
        host: &str,
        port: u16,
        uuid: Uuid,
        name: &str,
        salt: &str,
    ) -> Result<(RegisterResponse, bool), RingError> {
        crypto::decode_salt(salt)?;

        let mut inner = self.inner.lock().await;

        if let Some(pos) = inner.members.iter().position(|m| m.uuid == uuid) {
            let existing = &inner.members[pos];
            if existing.salt != salt {
                return Err(RingError::InvalidInput(
                    "salt does not match registered member".into(),
                ));
            }
            if pos == 0 {
                return Err(RingError::InvalidInput(
                    "origin does not register with itself".into(),
                ));
            }
            // Same pointer it was handed the first time: its predecessor
            // in join order.
            let next = &inner.members[pos - 1];
            let response = RegisterResponse {
                next_host: next.host.clone(),
                next_port: next.port,
                timeout: self.relay_timeout.as_secs(),
                x_game_timestamp: inner.clock,
            };
            tracing::info!(%uuid, name, "member re-joined (already registered)");
            return Ok((response, true));
        }

        // First member triggers the origin's lazy self-insertion.
        if inner.members.is_empty() {
            let me = self.self_peer();
            inner.members.push(me);
        }

        let tail = inner.members.last().cloned().unwrap_or_else(|| self.self_peer());
        inner.members.push(Peer {
            host: host.to_string(),
            port,
            uuid,
            name: name.to_string(),
            salt: salt.to_string(),
        });
        tracing::info!(%uuid, name, next = %tail.addr(), members = inner.members.len(), "member joined");

        Ok((
            RegisterResponse {
                next_host: tail.host,
                next_port: tail.port,
                timeout: self.relay_timeout.as_secs(),
                x_game_timestamp: inner.clock,
            },
            false,
        ))
    }

    /// Remove a member, re-linking the ring around it first.
    ///
    /// The departing member's relay-order predecessor sits at join index
    /// i+1 and must be repointed at index i−1 before the record is dropped.
    /// If that reconfigure call fails the registry stays unchanged — a ring
    /// with a stale pointer into a live member beats one with a hole in it.
    pub async fn leave(&self, uuid: Uuid, salt: &str) -> Result<(), RingError> {
        let repoint = {
            let inner = self.inner.lock().await;
            let pos = inner
                .members
                .iter()
                .position(|m| m.uuid == uuid)
                .ok_or_else(|| RingError::NotFound(format!("node with uuid {uuid} not found")))?;
            if inner.members[pos].salt != salt {
                return Err(RingError::InvalidInput(
                    "salt does not match registered member".into(),
                ));
            }
            if pos == 0 {
                return Err(RingError::InvalidInput(
                    "origin cannot unregister from its own ring".into(),
                ));
            }
            if pos + 1 < inner.members.len() {
                Some((
                    inner.members[pos + 1].clone(),
                    inner.members[pos - 1].clone(),
                    inner.clock,
                ))
            } else {
                // Ring tail: nothing forwards to it yet, no one to notify.
                None
            }
        };

        if let Some((predecessor, successor, clock)) = repoint {
            self.client
                .reconfigure(
                    &predecessor.host,
                    predecessor.port,
                    predecessor.uuid,
                    &predecessor.salt,
                    &successor.host,
                    successor.port,
                    clock,
                )
                .await
                .map_err(|e| {
                    tracing::warn!(
                        predecessor = %predecessor.addr(),
                        error = %e,
                        "reconfigure failed, abandoning unregister"
                    );
                    RingError::Unavailable(format!(
                        "could not reconfigure {}: {e}",
                        predecessor.addr()
                    ))
                })?;
        }

        let mut inner = self.inner.lock().await;
        inner.members.retain(|m| m.uuid != uuid);
        tracing::info!(%uuid, members = inner.members.len(), "member unregistered");
        Ok(())
    }

    /// Current member list in join order. Origin only; empty elsewhere.
    pub async fn members(&self) -> Vec<Peer> {
        self.inner.lock().await.members.clone()
    }
}

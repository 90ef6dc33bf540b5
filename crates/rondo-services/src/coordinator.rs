//! Round-trip coordination — origin only.
//!
//! `send_round_trip` installs the single pending slot, computes the chain
//! the ring is expected to produce, dispatches to the last-joined member,
//! and parks on a oneshot until the relay engine's terminal branch signals
//! completion or the window elapses. Every timeout spends one unit of the
//! circuit-breaker budget; once the budget is gone the ring is closed for
//! good.

use bytes::Bytes;
use tokio::sync::oneshot;

use rondo_core::chain::{HopSignature, SignatureChain};
use rondo_core::wire::RoundTripResult;
use rondo_core::{crypto, RingError};

use crate::node::{Peer, PendingRoundTrip, RingNode};

impl RingNode {
    /// The chain a clean traversal must produce: the content hashed under
    /// every member's salt, in join order. The origin's registry knows all
    /// the salts, so the whole chain is computable before dispatch.
    fn expected_chain(
        &self,
        content: &[u8],
        content_type: &str,
        members: &[Peer],
    ) -> Result<SignatureChain, RingError> {
        let mut chain = SignatureChain::default();
        for member in members {
            chain.push(HopSignature {
                name: member.name.clone(),
                hash: crypto::salted_hash(content, &member.salt)?,
                content_type: content_type.to_string(),
                content_length: content.len(),
            });
        }
        Ok(chain)
    }

    /// Send a message around the ring and block until it comes back,
    /// times out, or the circuit breaker rejects the attempt outright.
    pub async fn send_round_trip(
        &self,
        content: Bytes,
        content_type: &str,
    ) -> Result<RoundTripResult, RingError> {
        let (receiver, target, timestamp, expected) = {
            let mut inner = self.inner.lock().await;
            if inner.timeouts >= self.max_timeouts {
                return Err(RingError::Closed);
            }
            if inner.members.is_empty() {
                let me = self.self_peer();
                inner.members.push(me);
            }

            let expected = self.expected_chain(&content, content_type, &inner.members)?;
            let original_hash = crypto::salted_hash(&content, &self.identity.salt)?;
            let (sender, receiver) = oneshot::channel();
            // Single slot, overwrite semantics: a previous trip still in
            // flight loses its rendezvous and will time out on its own.
            inner.pending = Some(PendingRoundTrip {
                result: RoundTripResult::pending(content_type, content.len(), original_hash),
                notify: sender,
            });

            let target = inner
                .members
                .last()
                .cloned()
                .unwrap_or_else(|| self.self_peer());
            (receiver, target, inner.clock, expected)
        };

        tracing::info!(target = %target.addr(), timestamp, "dispatching round trip");
        if let Err(e) = self
            .client
            .relay(
                &target.host,
                target.port,
                content.clone(),
                content_type,
                &SignatureChain::default(),
                timestamp,
            )
            .await
        {
            self.inner.lock().await.pending = None;
            return Err(RingError::Unavailable(format!(
                "could not dispatch to {}: {e}",
                target.addr()
            )));
        }

        let result = match tokio::time::timeout(self.relay_timeout, receiver).await {
            Ok(Ok(result)) => result,
            // Elapsed, or the slot was overwritten and our sender dropped.
            // Either way the trip is spent: free the slot, charge the
            // breaker, report the timeout.
            Ok(Err(_)) | Err(_) => {
                let mut inner = self.inner.lock().await;
                inner.pending = None;
                inner.timeouts += 1;
                tracing::warn!(timeouts = inner.timeouts, "round trip timed out");
                return Err(RingError::TimedOut);
            }
        };

        // End-to-end integrity: the content must hash identically under the
        // origin's salt before and after the traversal. Independent of the
        // per-hop chain.
        if crypto::salted_hash(&content, &self.identity.salt)? != result.received_hash {
            return Err(RingError::Unavailable(
                "content altered in transit".into(),
            ));
        }

        // Per-hop verification: the observed chain, reversed, must match
        // the expected one hash-for-hash. A mismatch pins the fault to a
        // specific hop even when the end-to-end check passed.
        if !SignatureChain::matches(&expected, &result.signatures) {
            return Err(RingError::Unavailable("signature chain mismatch".into()));
        }

        Ok(result)
    }
}

//! The relay engine — every node runs this, origin included.
//!
//! A relay either forwards to the node's successor (signing on the way
//! through) or, at the origin, terminates the round trip and wakes the
//! coordinator. Reconfiguration is staged here too: `/reconfigure` parks a
//! pending successor, and the relay path promotes it the moment a message
//! carries a timestamp at or past the activation point.

use bytes::Bytes;
use uuid::Uuid;

use rondo_core::chain::{HopSignature, SignatureChain};
use rondo_core::wire::ContentResult;
use rondo_core::{crypto, RingError};

use crate::node::{PendingSuccessor, RingNode};

impl RingNode {
    /// Sign the message content with this node's own salt.
    pub(crate) fn sign(&self, content: &[u8], content_type: &str) -> Result<HopSignature, RingError> {
        Ok(HopSignature {
            name: self.identity.name.clone(),
            hash: crypto::salted_hash(content, &self.identity.salt)?,
            content_type: content_type.to_string(),
            content_length: content.len(),
        })
    }

    /// Process one inbound relay hop.
    ///
    /// Returns this node's own signature as the hop acknowledgment in every
    /// successful case. Ordering guarantee: a relay carrying a timestamp
    /// below this node's last-seen one is causally stale and rejected
    /// before anything else happens.
    pub async fn relay(
        &self,
        content: Bytes,
        content_type: &str,
        chain: SignatureChain,
        timestamp: u64,
    ) -> Result<HopSignature, RingError> {
        let own_signature = self.sign(&content, content_type)?;

        let next = {
            let mut inner = self.inner.lock().await;
            if timestamp < inner.last_seen {
                return Err(RingError::InvalidInput(format!(
                    "stale timestamp {timestamp}, node has seen {}",
                    inner.last_seen
                )));
            }
            inner.promote_pending_successor(timestamp);

            match inner.successor.clone() {
                Some(next) => {
                    // The hop counts as processed from here on, whether or
                    // not the forward below succeeds.
                    inner.last_seen = timestamp;
                    next
                }
                None => {
                    // No successor: this is the origin and the chain has
                    // come full circle. An unsolicited relay is rejected
                    // before any state changes hands.
                    let pending = inner
                        .pending
                        .take()
                        .ok_or_else(|| RingError::InvalidInput("no waiting message".into()))?;
                    inner.last_seen = timestamp;

                    let mut result = pending.result;
                    result.content_result = if own_signature.hash == result.original_hash {
                        ContentResult::Success
                    } else {
                        ContentResult::Failure
                    };
                    result.received_hash = own_signature.hash.clone();
                    result.received_length = content.len();
                    result.received_content_type = content_type.to_string();
                    let mut observed = chain;
                    observed.push(own_signature.clone());
                    result.signatures = observed;

                    inner.clock += 1;
                    tracing::debug!(clock = inner.clock, result = ?result.content_result, "round trip completed");
                    // The coordinator may already have given up; a closed
                    // receiver just means the result goes unobserved.
                    let _ = pending.notify.send(result);
                    return Ok(own_signature);
                }
            }
        };

        let mut forwarded = chain;
        forwarded.push(own_signature.clone());

        if let Err(primary) = self
            .client
            .relay(
                &next.host,
                next.port,
                content.clone(),
                content_type,
                &forwarded,
                timestamp,
            )
            .await
        {
            tracing::warn!(
                next = %format!("{}:{}", next.host, next.port),
                error = %primary,
                "relay forward failed, falling back to origin"
            );
            // One fallback straight to the origin keeps the message moving
            // past a single dead link; the caller still sees the failure.
            if let Some((host, port)) = self.registrar.clone() {
                if let Err(fallback) = self
                    .client
                    .relay(&host, port, content, content_type, &forwarded, timestamp)
                    .await
                {
                    tracing::error!(error = %fallback, "fallback relay to origin failed");
                }
            }
            return Err(RingError::Unavailable(format!(
                "could not relay message to {}:{}",
                next.host, next.port
            )));
        }

        Ok(own_signature)
    }

    /// Stage a successor change, effective for relays carrying a timestamp
    /// at or past `activates_at`. Authenticated by exact identity match —
    /// only the origin's registry knows this node's salt.
    pub async fn reconfigure(
        &self,
        uuid: Uuid,
        salt: &str,
        next_host: &str,
        next_port: u16,
        activates_at: u64,
    ) -> Result<String, RingError> {
        if uuid != self.identity.uuid || salt != self.identity.salt {
            return Err(RingError::InvalidInput(
                "identity does not match this node".into(),
            ));
        }
        let mut inner = self.inner.lock().await;
        inner.pending_successor = Some(PendingSuccessor {
            host: next_host.to_string(),
            port: next_port,
            activates_at,
        });
        tracing::info!(
            next = %format!("{next_host}:{next_port}"),
            activates_at,
            "successor change staged"
        );
        Ok(format!("Reconfigured node {uuid}"))
    }

    #[cfg(test)]
    pub(crate) async fn set_successor_for_test(&self, host: &str, port: u16) {
        self.inner.lock().await.successor = Some(crate::node::Successor {
            host: host.to_string(),
            port,
        });
    }
}

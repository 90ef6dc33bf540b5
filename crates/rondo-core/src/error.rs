//! Protocol error taxonomy.
//!
//! Every failure a ring operation can surface maps to exactly one of these
//! variants. Handlers translate them to HTTP status codes at the API edge;
//! nothing below the API layer retries on `InvalidInput` or `NotFound`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RingError {
    /// Malformed salt, identity/secret mismatch, stale timestamp,
    /// or a relay arriving with no message waiting.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown member on unregister.
    #[error("not found: {0}")]
    NotFound(String),

    /// Relay forwarding failed (after the one fallback attempt) or the
    /// round trip returned altered content.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// No round-trip completion within the configured window.
    /// Each occurrence counts toward the circuit breaker.
    #[error("round trip timed out")]
    TimedOut,

    /// Circuit breaker tripped: the timeout budget is exhausted and the
    /// ring accepts no further sends until the process restarts.
    #[error("ring is closed")]
    Closed,
}

//! rondo-services — the ring protocol engine.
//!
//! One [`RingNode`] per process holds everything: the membership registry
//! (populated only at the origin), the relay engine every member runs, the
//! timestamp-gated reconfiguration slot, and the origin's round-trip
//! coordinator. The HTTP layer in rondo-api is a thin shell over this crate.

mod coordinator;
mod node;
mod peer_client;
mod registry;
mod relay;

pub use node::{NodeIdentity, NodeStatus, Peer, RingNode};
pub use peer_client::{PeerClient, PeerError};

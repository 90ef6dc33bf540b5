//! rondo-core — shared types, salted hashing, config, and the protocol
//! error taxonomy. All other rondo crates depend on this one.

pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod wire;

pub use chain::{HopSignature, SignatureChain};
pub use error::RingError;
pub use wire::{ContentResult, RegisterResponse, RoundTripResult, TIMESTAMP_HEADER};

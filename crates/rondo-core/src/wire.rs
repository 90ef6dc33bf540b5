//! Wire-format DTOs shared by the HTTP surface and the outbound peer client.
//!
//! Field names are camelCase on the wire so that every node in a mixed ring
//! agrees on the contract regardless of implementation.

use serde::{Deserialize, Serialize};

use crate::chain::SignatureChain;

/// Header carrying the logical timestamp on `/relay` requests.
pub const TIMESTAMP_HEADER: &str = "X-Game-Timestamp";

/// Successor pointer handed to a member when it joins, and pushed to a
/// member when the ring is re-linked around a departure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub next_host: String,
    pub next_port: u16,
    /// Round-trip wait window, seconds.
    pub timeout: u64,
    /// Ring clock at the time the pointer was issued.
    pub x_game_timestamp: u64,
}

/// Outcome of the end-to-end content comparison at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentResult {
    /// Round trip still in flight.
    Unknown,
    Success,
    Failure,
}

/// Completed (or pending) round trip as reported by the origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundTripResult {
    pub content_result: ContentResult,
    pub original_content_type: String,
    pub original_length: usize,
    /// Hash of the dispatched content under the origin's own salt.
    pub original_hash: String,
    /// Hash of the content as it came back, origin's salt again.
    pub received_hash: String,
    pub received_length: usize,
    pub received_content_type: String,
    /// The chain observed on the way back, traversal order.
    pub signatures: SignatureChain,
}

impl RoundTripResult {
    /// Fresh pending slot for a message about to be dispatched.
    pub fn pending(content_type: &str, length: usize, original_hash: String) -> Self {
        Self {
            content_result: ContentResult::Unknown,
            original_content_type: content_type.to_string(),
            original_length: length,
            original_hash,
            received_hash: String::new(),
            received_length: 0,
            received_content_type: String::new(),
            signatures: SignatureChain::default(),
        }
    }
}

//! The tamper-evident signature chain.
//!
//! As a message travels the ring, every hop appends one [`HopSignature`]
//! carrying its salted content hash. Insertion order is traversal order:
//! the origin dispatches with an empty chain, the last-joined member signs
//! first, and the origin itself signs last when the message comes home.
//! The origin compares the accumulated chain against the one it computed
//! up front from its membership list.

use serde::{Deserialize, Serialize};

/// One hop's signature over the message content. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HopSignature {
    /// Signing member's name.
    pub name: String,
    /// Salted content hash, base64.
    pub hash: String,
    pub content_type: String,
    pub content_length: usize,
}

/// Ordered sequence of hop signatures, newest at the tail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureChain {
    pub items: Vec<HopSignature>,
}

impl SignatureChain {
    pub fn new(items: Vec<HopSignature>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, signature: HopSignature) {
        self.items.push(signature);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Compare an expected chain (join order) against an observed chain
    /// (traversal order). The two run in opposite directions, so the
    /// observed side is reversed before the element-wise hash comparison.
    /// Any length difference or mismatched position means a hop altered
    /// content or a hop is missing.
    pub fn matches(expected: &SignatureChain, observed: &SignatureChain) -> bool {
        if expected.items.len() != observed.items.len() {
            return false;
        }
        expected
            .items
            .iter()
            .zip(observed.items.iter().rev())
            .all(|(want, got)| want.hash == got.hash)
    }
}

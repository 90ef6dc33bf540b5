//! Salted content hashing.
//!
//! Every ring member carries a private salt: 9 random bytes, URL-safe base64.
//! A hop's content hash is BLAKE3 over the decoded salt followed by the
//! message bytes, base64-encoded. Two members hashing identical content thus
//! produce distinct, individually attributable digests — the building block
//! of the signature chain.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use rand::RngCore;

use crate::error::RingError;

/// Random bytes behind a freshly generated salt.
const SALT_LEN: usize = 9;

/// Generate a new member salt.
///
/// 9 bytes encode to exactly 12 URL-safe characters with no padding,
/// so salts travel cleanly inside query strings.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}

/// Decode a salt, rejecting anything that is not valid URL-safe base64.
pub fn decode_salt(salt: &str) -> Result<Vec<u8>, RingError> {
    URL_SAFE
        .decode(salt)
        .map_err(|_| RingError::InvalidInput("could not decode salt as base64".into()))
}

/// Hash content under a member's salt: base64(BLAKE3(salt_bytes || content)).
pub fn salted_hash(content: &[u8], salt: &str) -> Result<String, RingError> {
    let salt_bytes = decode_salt(salt)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(&salt_bytes);
    hasher.update(content);
    Ok(STANDARD.encode(hasher.finalize().as_bytes()))
}

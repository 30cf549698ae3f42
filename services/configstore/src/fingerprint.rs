//! Content fingerprints for configuration bodies.
//!
//! # Purpose
//! Produces the `content_sha256` stored with every version. The version store
//! compares fingerprints to suppress updates that would not change the body.
use sha2::{Digest, Sha256};

/// Length of a fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 64;

/// SHA-256 of the raw body bytes, lowercase hex.
pub fn fingerprint(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    hex::encode(hasher.finalize())
}

/// Fingerprint of a stored version, falling back to re-hashing its body when
/// the row predates stored fingerprints.
pub fn stored_or_rehash(stored: Option<&str>, body_raw: &str) -> String {
    match stored {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => fingerprint(body_raw.as_bytes()),
    }
}

//! Hashing utilities for cache keys

use sha2::{Digest, Sha256};

/// SHA-256 of the text, lower-case hex.
///
/// Stable across runs and platforms, so two byte-identical submissions
/// always share a key.
pub fn fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// First 12 hex chars, for logs
pub fn short_fingerprint(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

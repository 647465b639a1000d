//! Sealed document fingerprinting.

use sha2::{Digest, Sha256};

use crate::evidence::verify::digests_match;

/// SHA-256 of `data` as lowercase hex.
pub fn hash_document(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Check `data` against a stored document hash.
pub fn verify_document(data: &[u8], expected_hex: &str) -> bool {
    digests_match(&hash_document(data), expected_hex)
}

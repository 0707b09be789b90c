//! SHA-256 digests in the canonical `sha256:<hex>` form
//!
//! Used to fingerprint snapshots and raw captures in logs and in the cache
//! report, so two runs can be compared at a glance.

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Digest of an in-memory byte slice.
pub fn digest_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Short form of a digest for log lines: the first 12 hex characters.
pub fn short(digest: &str) -> &str {
    let hex = digest.strip_prefix(PREFIX).unwrap_or(digest);
    &hex[..hex.len().min(12)]
}

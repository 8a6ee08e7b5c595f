//! Content fingerprinting.

use sha2::{Digest, Sha256};

/// Computes the content fingerprint of a payload.
///
/// The fingerprint is the SHA-256 digest of the exact byte sequence as a
/// 64-character lowercase hex string. No normalization is applied:
/// byte-identical payloads always produce the same fingerprint, and the
/// orchestrator treats two snapshots with equal fingerprints (for the same
/// source URL) as the same content.
pub(crate) fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

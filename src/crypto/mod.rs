//! Hashing utilities.
//!
//! Everything here is one-way: secrets and reference values are digested for
//! storage or display and never kept in recoverable form.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of arbitrary bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Derive a proof's integrity fingerprint.
///
/// `sha256(merchant || sha256(reference) || created_at)` — the raw reference
/// value is folded in only through its digest, so the fingerprint is a
/// privacy-preserving display value. It is never recomputed or compared
/// against a freshly supplied reference.
pub fn proof_fingerprint(merchant: &str, reference: &str, created_at: &DateTime<Utc>) -> String {
    let reference_digest = sha256_hex(reference.as_bytes());
    let preimage = format!("{merchant}{reference_digest}{}", created_at.to_rfc3339());
    sha256_hex(preimage.as_bytes())
}

//! Merchant API-key secrets.
//!
//! Secrets are formatted as `pd_<48 hex chars>`. Only the SHA-256 digest of
//! the full secret string is ever persisted; generation returns the raw
//! secret to the caller exactly once.

use crate::crypto;

/// Prefix tagging every merchant API-key secret.
pub const KEY_PREFIX: &str = "pd_";

/// Entropy carried by a secret.
const SECRET_BYTES: usize = 24;

/// Generate a fresh high-entropy secret.
pub fn generate_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill(&mut bytes);
    format!("{KEY_PREFIX}{}", hex::encode(bytes))
}

/// Deterministic one-way digest of a secret, used both at issuance (to
/// store) and at lookup (to match).
pub fn digest(secret: &str) -> String {
    crypto::sha256_hex(secret.as_bytes())
}

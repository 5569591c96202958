//! Merchant directory entries and API-key metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of a merchant identifier.
pub const MERCHANT_ID_LEN: usize = 10;

/// Length of an API-key identifier (not the secret).
pub const KEY_ID_LEN: usize = 12;

pub fn generate_merchant_id() -> String {
    super::random_id(MERCHANT_ID_LEN)
}

pub fn generate_key_id() -> String {
    super::random_id(KEY_ID_LEN)
}

/// A registered merchant. Created by admin action; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Stored metadata for a merchant API key.
///
/// Only the one-way digest of the secret is persisted; the raw secret is
/// returned to the caller exactly once at issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantApiKey {
    pub id: String,
    pub merchant_id: String,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set once, irreversibly, when the key is revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl MerchantApiKey {
    /// A key is active iff it has not been revoked.
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}

/// Result of issuing a new API key. Carries the raw secret; this is the only
/// place it ever appears.
#[derive(Debug, Clone)]
pub struct IssuedKey {
    pub key_id: String,
    pub secret: String,
    pub created_at: DateTime<Utc>,
}

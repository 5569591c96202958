//! Merchant directory and API-key credential store.
//!
//! The credential authority's persistence side: key secrets are stored only
//! as SHA-256 digests, revocation is a one-way conditional update, and
//! lookup by secret denies unknown and revoked keys identically.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::auth::api_key;
use crate::domain::{
    generate_key_id, generate_merchant_id, IssuedKey, Merchant, MerchantApiKey,
};
use crate::store::{parse_opt_ts, parse_ts, CoreError, Result};

pub struct MerchantStore {
    pool: SqlitePool,
}

impl MerchantStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_merchant(&self, name: &str) -> Result<Merchant> {
        if name.is_empty() {
            return Err(CoreError::required("name"));
        }

        let id = generate_merchant_id();
        let created_at = Utc::now();
        sqlx::query("INSERT INTO merchants (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

        tracing::info!(merchant_id = %id, name = %name, "merchant created");
        Ok(Merchant {
            id,
            name: name.to_string(),
            created_at,
        })
    }

    pub async fn get_merchant(&self, id: &str) -> Result<Merchant> {
        let row = sqlx::query_as::<_, MerchantRow>(
            "SELECT id, name, created_at FROM merchants WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::MerchantNotFound(id.to_string()))?;

        Merchant::try_from(row)
    }

    /// Newest first.
    pub async fn list_merchants(&self) -> Result<Vec<Merchant>> {
        let rows = sqlx::query_as::<_, MerchantRow>(
            "SELECT id, name, created_at FROM merchants ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Merchant::try_from).collect()
    }

    /// Issue a new API key for an existing merchant. The raw secret is
    /// returned exactly once and never persisted.
    pub async fn issue_key(&self, merchant_id: &str, label: Option<&str>) -> Result<IssuedKey> {
        self.get_merchant(merchant_id).await?;

        let secret = api_key::generate_secret();
        let digest = api_key::digest(&secret);
        let key_id = generate_key_id();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO merchant_api_keys (id, merchant_id, key_digest, label, created_at, revoked_at)
            VALUES (?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(&key_id)
        .bind(merchant_id)
        .bind(&digest)
        .bind(label)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::info!(merchant_id = %merchant_id, key_id = %key_id, "api key issued");
        Ok(IssuedKey {
            key_id,
            secret,
            created_at,
        })
    }

    /// Key metadata for one merchant, newest first. Never exposes digests or
    /// secrets.
    pub async fn list_keys(&self, merchant_id: &str) -> Result<Vec<MerchantApiKey>> {
        self.get_merchant(merchant_id).await?;

        let rows = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, merchant_id, label, created_at, revoked_at
            FROM merchant_api_keys
            WHERE merchant_id = ?
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MerchantApiKey::try_from).collect()
    }

    /// Revoke a key. Idempotent: revoking an already-revoked key succeeds and
    /// leaves the original `revoked_at` untouched.
    pub async fn revoke_key(&self, key_id: &str) -> Result<DateTime<Utc>> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE merchant_api_keys SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL",
        )
        .bind(now.to_rfc3339())
        .bind(key_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            tracing::info!(key_id = %key_id, "api key revoked");
            return Ok(now);
        }

        // Either the key does not exist or it was already revoked.
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT revoked_at FROM merchant_api_keys WHERE id = ?")
                .bind(key_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            None => Err(CoreError::KeyNotFound(key_id.to_string())),
            Some((Some(revoked_at),)) => parse_ts("revoked_at", &revoked_at),
            Some((None,)) => Err(CoreError::Internal(format!(
                "revocation of key {key_id} matched no row but key is active"
            ))),
        }
    }

    /// Resolve a presented secret to its owning merchant.
    ///
    /// Returns `None` for unknown and revoked keys alike; callers cannot
    /// distinguish the two. Revocation takes effect on the very next lookup.
    pub async fn resolve(&self, secret: &str) -> Result<Option<Merchant>> {
        if !secret.starts_with(api_key::KEY_PREFIX) {
            return Ok(None);
        }

        let digest = api_key::digest(secret);
        let row = sqlx::query_as::<_, MerchantRow>(
            r#"
            SELECT m.id, m.name, m.created_at
            FROM merchant_api_keys k
            JOIN merchants m ON m.id = k.merchant_id
            WHERE k.key_digest = ? AND k.revoked_at IS NULL
            "#,
        )
        .bind(&digest)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Merchant::try_from).transpose()
    }
}

#[derive(Debug, FromRow)]
struct MerchantRow {
    id: String,
    name: String,
    created_at: String,
}

impl TryFrom<MerchantRow> for Merchant {
    type Error = CoreError;

    fn try_from(row: MerchantRow) -> Result<Self> {
        Ok(Merchant {
            id: row.id,
            name: row.name,
            created_at: parse_ts("created_at", &row.created_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct ApiKeyRow {
    id: String,
    merchant_id: String,
    label: Option<String>,
    created_at: String,
    revoked_at: Option<String>,
}

impl TryFrom<ApiKeyRow> for MerchantApiKey {
    type Error = CoreError;

    fn try_from(row: ApiKeyRow) -> Result<Self> {
        Ok(MerchantApiKey {
            id: row.id,
            merchant_id: row.merchant_id,
            label: row.label,
            created_at: parse_ts("created_at", &row.created_at)?,
            revoked_at: parse_opt_ts("revoked_at", row.revoked_at.as_deref())?,
        })
    }
}

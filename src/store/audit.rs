//! Append-only audit journal.
//!
//! [`AuditLog::append_tx`] runs against the caller's transaction so the event
//! write and the state mutation it records commit or fail as one unit. No
//! update or delete operation exists.

use chrono::Utc;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

use crate::domain::{AuditEvent, AuditEventKind};
use crate::store::{parse_ts, CoreError, Result};

pub struct AuditLog {
    pool: SqlitePool,
}

impl AuditLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an event inside the caller's transaction.
    pub async fn append_tx(
        tx: &mut Transaction<'_, Sqlite>,
        public_id: &str,
        kind: AuditEventKind,
        metadata: Option<serde_json::Value>,
    ) -> Result<()> {
        let metadata_json = metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| CoreError::Internal(format!("invalid audit metadata: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO audit_events (public_id, kind, at, metadata)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(public_id)
        .bind(kind.to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(metadata_json)
        .execute(&mut **tx)
        .await?;

        tracing::info!(public_id = %public_id, kind = %kind, "audit event appended");
        Ok(())
    }

    /// Events for one proof in ascending insertion order.
    pub async fn list_for(&self, public_id: &str) -> Result<Vec<AuditEvent>> {
        let rows = sqlx::query_as::<_, AuditEventRow>(
            r#"
            SELECT id, public_id, kind, at, metadata
            FROM audit_events
            WHERE public_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(public_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditEvent::try_from).collect()
    }
}

#[derive(Debug, FromRow)]
struct AuditEventRow {
    id: i64,
    public_id: String,
    kind: String,
    at: String,
    metadata: Option<String>,
}

impl TryFrom<AuditEventRow> for AuditEvent {
    type Error = CoreError;

    fn try_from(row: AuditEventRow) -> Result<Self> {
        let metadata = row
            .metadata
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| CoreError::Internal(format!("invalid audit metadata: {e}")))?;

        Ok(AuditEvent {
            id: row.id,
            public_id: row.public_id,
            kind: AuditEventKind::parse(&row.kind),
            at: parse_ts("at", &row.at)?,
            metadata,
        })
    }
}

//! Proof registry and lifecycle state machine.
//!
//! Transitions: `issued -> pending -> {verified, rejected}`. Guard checks and
//! mutations are a single conditional UPDATE (checked by rows-affected), so
//! concurrent admin operations on the same proof are linearizable: at most
//! one wins, the losers observe an illegal-transition error naming the
//! now-current status. The audit append shares the transaction.

use chrono::Utc;
use serde_json::json;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

use crate::crypto;
use crate::domain::{
    generate_public_id, AuditEventKind, EvidenceRef, IssuerType, Proof, ProofStatus,
};
use crate::store::{parse_opt_ts, parse_ts, AuditLog, CoreError, Result};

pub struct ProofStore {
    pool: SqlitePool,
}

impl ProofStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a proof via the self-service customer path. The record enters
    /// `issued` and waits for evidence.
    pub async fn create_customer_proof(
        &self,
        merchant: &str,
        reference: &str,
        item: Option<&str>,
    ) -> Result<Proof> {
        if merchant.is_empty() {
            return Err(CoreError::required("merchant"));
        }
        if reference.is_empty() {
            return Err(CoreError::required("reference"));
        }

        let created_at = Utc::now();
        let public_id = generate_public_id();
        let proof_hash = crypto::proof_fingerprint(merchant, reference, &created_at);

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO proofs (public_id, merchant, item, proof_hash, status, issuer_type, created_at)
            VALUES (?, ?, ?, ?, 'issued', 'user', ?)
            "#,
        )
        .bind(&public_id)
        .bind(merchant)
        .bind(item)
        .bind(&proof_hash)
        .bind(created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        AuditLog::append_tx(
            &mut tx,
            &public_id,
            AuditEventKind::ProofCreated,
            Some(json!({"issuer": "user"})),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(public_id = %public_id, merchant = %merchant, "customer proof created");
        self.fetch(&public_id).await
    }

    /// Create a proof via the authenticated merchant path. The record enters
    /// `verified` directly with `verified_at` equal to the creation
    /// timestamp; two audit events are appended in order.
    pub async fn create_merchant_proof(
        &self,
        merchant_id: &str,
        merchant_name: &str,
        reference: &str,
        item: Option<&str>,
    ) -> Result<Proof> {
        if reference.is_empty() {
            return Err(CoreError::required("reference"));
        }

        let created_at = Utc::now();
        let public_id = generate_public_id();
        let proof_hash = crypto::proof_fingerprint(merchant_name, reference, &created_at);

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO proofs (
                public_id, merchant, item, proof_hash,
                status, verified_at,
                issuer_type, issuer_id, created_at
            ) VALUES (?, ?, ?, ?, 'verified', ?, 'merchant', ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(merchant_name)
        .bind(item)
        .bind(&proof_hash)
        .bind(created_at.to_rfc3339())
        .bind(merchant_id)
        .bind(created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        AuditLog::append_tx(
            &mut tx,
            &public_id,
            AuditEventKind::ProofCreated,
            Some(json!({"issuer": "merchant", "merchant_id": merchant_id})),
        )
        .await?;
        AuditLog::append_tx(
            &mut tx,
            &public_id,
            AuditEventKind::AutoVerified,
            Some(json!({"reason": "merchant_issued"})),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(public_id = %public_id, merchant_id = %merchant_id, "merchant proof issued");
        self.fetch(&public_id).await
    }

    /// Fetch a proof by its public identifier.
    pub async fn fetch(&self, public_id: &str) -> Result<Proof> {
        let row = sqlx::query_as::<_, ProofRow>(
            r#"
            SELECT public_id, merchant, item, proof_hash, status,
                   evidence_path, evidence_mime, evidence_uploaded_at,
                   verified_at, rejected_at, rejection_reason,
                   issuer_type, issuer_id, created_at
            FROM proofs
            WHERE public_id = ?
            "#,
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::ProofNotFound(public_id.to_string()))?;

        Proof::try_from(row)
    }

    /// Record an evidence submission and move the proof to `pending`.
    ///
    /// Unconditional for any existing proof: a submission against a decided
    /// record reopens review, so the prior decision fields are cleared and
    /// review starts from a clean slate.
    pub async fn submit_evidence(
        &self,
        public_id: &str,
        evidence_path: &str,
        evidence_mime: Option<&str>,
    ) -> Result<Proof> {
        if evidence_path.is_empty() {
            return Err(CoreError::required("evidence_path"));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE proofs
            SET status = 'pending',
                evidence_path = ?,
                evidence_mime = ?,
                evidence_uploaded_at = ?,
                verified_at = NULL,
                rejected_at = NULL,
                rejection_reason = NULL
            WHERE public_id = ?
            "#,
        )
        .bind(evidence_path)
        .bind(evidence_mime)
        .bind(now.to_rfc3339())
        .bind(public_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProofNotFound(public_id.to_string()));
        }

        AuditLog::append_tx(
            &mut tx,
            public_id,
            AuditEventKind::EvidenceUploaded,
            Some(json!({"path": evidence_path, "mime": evidence_mime})),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(public_id = %public_id, "evidence submitted, proof pending review");
        self.fetch(public_id).await
    }

    /// Admin approval: `pending -> verified`.
    pub async fn verify(&self, public_id: &str) -> Result<Proof> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE proofs
            SET status = 'verified',
                verified_at = ?,
                rejected_at = NULL,
                rejection_reason = NULL
            WHERE public_id = ? AND status = 'pending'
            "#,
        )
        .bind(now.to_rfc3339())
        .bind(public_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::transition_failure(&mut tx, public_id, "verify").await);
        }

        AuditLog::append_tx(&mut tx, public_id, AuditEventKind::AdminVerified, None).await?;
        tx.commit().await?;

        tracing::info!(public_id = %public_id, "proof verified");
        self.fetch(public_id).await
    }

    /// Admin rejection: `pending -> rejected`. The reason is validated before
    /// any storage access.
    pub async fn reject(&self, public_id: &str, reason: &str) -> Result<Proof> {
        if reason.is_empty() {
            return Err(CoreError::Validation {
                field: "reason",
                message: "rejection reason is required".to_string(),
            });
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE proofs
            SET status = 'rejected',
                rejected_at = ?,
                rejection_reason = ?,
                verified_at = NULL
            WHERE public_id = ? AND status = 'pending'
            "#,
        )
        .bind(now.to_rfc3339())
        .bind(reason)
        .bind(public_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::transition_failure(&mut tx, public_id, "reject").await);
        }

        AuditLog::append_tx(
            &mut tx,
            public_id,
            AuditEventKind::AdminRejected,
            Some(json!({"reason": reason})),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(public_id = %public_id, "proof rejected");
        self.fetch(public_id).await
    }

    /// Classify a guarded update that matched no rows: the proof either does
    /// not exist or sits outside `pending`.
    async fn transition_failure(
        tx: &mut Transaction<'_, Sqlite>,
        public_id: &str,
        attempted: &'static str,
    ) -> CoreError {
        let current: std::result::Result<Option<(String,)>, sqlx::Error> =
            sqlx::query_as("SELECT status FROM proofs WHERE public_id = ?")
                .bind(public_id)
                .fetch_optional(&mut **tx)
                .await;

        match current {
            Ok(None) => CoreError::ProofNotFound(public_id.to_string()),
            Ok(Some((status,))) => CoreError::IllegalTransition {
                public_id: public_id.to_string(),
                current: status,
                attempted,
            },
            Err(e) => CoreError::Database(e),
        }
    }
}

#[derive(Debug, FromRow)]
struct ProofRow {
    public_id: String,
    merchant: String,
    item: Option<String>,
    proof_hash: String,
    status: String,
    evidence_path: Option<String>,
    evidence_mime: Option<String>,
    evidence_uploaded_at: Option<String>,
    verified_at: Option<String>,
    rejected_at: Option<String>,
    rejection_reason: Option<String>,
    issuer_type: String,
    issuer_id: Option<String>,
    created_at: String,
}

impl TryFrom<ProofRow> for Proof {
    type Error = CoreError;

    fn try_from(row: ProofRow) -> Result<Self> {
        let status = ProofStatus::parse(&row.status)
            .ok_or_else(|| CoreError::Internal(format!("unknown proof status: {}", row.status)))?;
        let issuer_type = IssuerType::parse(&row.issuer_type).unwrap_or(IssuerType::User);

        let evidence = row.evidence_path.map(|path| EvidenceRef {
            path,
            mime: row.evidence_mime,
        });

        Ok(Proof {
            public_id: row.public_id,
            merchant: row.merchant,
            item: row.item,
            proof_hash: row.proof_hash,
            status,
            evidence,
            evidence_uploaded_at: parse_opt_ts(
                "evidence_uploaded_at",
                row.evidence_uploaded_at.as_deref(),
            )?,
            verified_at: parse_opt_ts("verified_at", row.verified_at.as_deref())?,
            rejected_at: parse_opt_ts("rejected_at", row.rejected_at.as_deref())?,
            rejection_reason: row.rejection_reason,
            issuer_type,
            issuer_id: row.issuer_id,
            created_at: parse_ts("created_at", &row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PUBLIC_ID_LEN;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::migrations::run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_customer_proof_starts_issued() {
        let store = ProofStore::new(test_pool().await);

        let proof = store
            .create_customer_proof("Acme", "ORD-1", None)
            .await
            .unwrap();

        assert_eq!(proof.status, ProofStatus::Issued);
        assert_eq!(proof.public_id.len(), PUBLIC_ID_LEN);
        assert_eq!(proof.issuer_type, IssuerType::User);
        assert!(proof.verified_at.is_none());
        assert!(proof.rejected_at.is_none());
        assert!(proof.evidence.is_none());
    }

    #[tokio::test]
    async fn test_creation_requires_merchant_and_reference() {
        let store = ProofStore::new(test_pool().await);

        let err = store.create_customer_proof("", "ORD-1", None).await;
        assert!(matches!(
            err,
            Err(CoreError::Validation { field: "merchant", .. })
        ));

        let err = store.create_customer_proof("Acme", "", None).await;
        assert!(matches!(
            err,
            Err(CoreError::Validation { field: "reference", .. })
        ));
    }

    #[tokio::test]
    async fn test_evidence_moves_issued_to_pending() {
        let store = ProofStore::new(test_pool().await);
        let proof = store
            .create_customer_proof("Acme", "ORD-1", None)
            .await
            .unwrap();

        let updated = store
            .submit_evidence(&proof.public_id, "abc-1234-receipt.png", Some("image/png"))
            .await
            .unwrap();

        assert_eq!(updated.status, ProofStatus::Pending);
        let evidence = updated.evidence.unwrap();
        assert_eq!(evidence.path, "abc-1234-receipt.png");
        assert_eq!(evidence.mime.as_deref(), Some("image/png"));
        assert!(updated.evidence_uploaded_at.is_some());
    }

    #[tokio::test]
    async fn test_verify_requires_pending() {
        let store = ProofStore::new(test_pool().await);
        let proof = store
            .create_customer_proof("Acme", "ORD-1", None)
            .await
            .unwrap();

        let err = store.verify(&proof.public_id).await.unwrap_err();
        match err {
            CoreError::IllegalTransition { current, .. } => assert_eq!(current, "issued"),
            other => panic!("expected IllegalTransition, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_unknown_proof() {
        let store = ProofStore::new(test_pool().await);
        assert!(matches!(
            store.verify("missing1").await,
            Err(CoreError::ProofNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reject_requires_reason_before_storage() {
        let store = ProofStore::new(test_pool().await);
        let proof = store
            .create_customer_proof("Acme", "ORD-1", None)
            .await
            .unwrap();
        store
            .submit_evidence(&proof.public_id, "p.png", None)
            .await
            .unwrap();

        let err = store.reject(&proof.public_id, "").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: "reason", .. }));

        // No mutation happened: still pending, no rejection fields.
        let unchanged = store.fetch(&proof.public_id).await.unwrap();
        assert_eq!(unchanged.status, ProofStatus::Pending);
        assert!(unchanged.rejected_at.is_none());
        assert!(unchanged.rejection_reason.is_none());
    }

    #[tokio::test]
    async fn test_resubmission_reopens_review() {
        let store = ProofStore::new(test_pool().await);
        let proof = store
            .create_customer_proof("Acme", "ORD-1", None)
            .await
            .unwrap();
        store
            .submit_evidence(&proof.public_id, "first.png", None)
            .await
            .unwrap();
        let verified = store.verify(&proof.public_id).await.unwrap();
        assert!(verified.verified_at.is_some());

        let reopened = store
            .submit_evidence(&proof.public_id, "second.png", None)
            .await
            .unwrap();

        assert_eq!(reopened.status, ProofStatus::Pending);
        assert!(reopened.verified_at.is_none());
        assert!(reopened.rejected_at.is_none());
        assert!(reopened.rejection_reason.is_none());
        assert_eq!(reopened.evidence.unwrap().path, "second.png");
    }
}

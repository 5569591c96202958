//! Append-only audit events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Kind of a state-changing action recorded against a proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEventKind {
    ProofCreated,
    AutoVerified,
    EvidenceUploaded,
    AdminVerified,
    AdminRejected,
    /// Forward-compatible fallback for kinds this build does not know.
    Other(String),
}

impl AuditEventKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "proof_created" => AuditEventKind::ProofCreated,
            "auto_verified" => AuditEventKind::AutoVerified,
            "evidence_uploaded" => AuditEventKind::EvidenceUploaded,
            "admin_verified" => AuditEventKind::AdminVerified,
            "admin_rejected" => AuditEventKind::AdminRejected,
            other => AuditEventKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEventKind::ProofCreated => f.write_str("proof_created"),
            AuditEventKind::AutoVerified => f.write_str("auto_verified"),
            AuditEventKind::EvidenceUploaded => f.write_str("evidence_uploaded"),
            AuditEventKind::AdminVerified => f.write_str("admin_verified"),
            AuditEventKind::AdminRejected => f.write_str("admin_rejected"),
            AuditEventKind::Other(s) => f.write_str(s),
        }
    }
}

impl Serialize for AuditEventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AuditEventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AuditEventKind::parse(&s))
    }
}

/// One immutable entry in a proof's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Monotonically increasing identifier (insertion order).
    pub id: i64,
    /// Public identifier of the owning proof.
    pub public_id: String,
    pub kind: AuditEventKind,
    pub at: DateTime<Utc>,
    /// Optional structured context, e.g. `{"issuer": "merchant"}`.
    pub metadata: Option<serde_json::Value>,
}

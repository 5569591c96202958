//! Proof records and their lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a proof's externally shared identifier.
pub const PUBLIC_ID_LEN: usize = 8;

/// Generate a fresh public identifier for a proof.
pub fn generate_public_id() -> String {
    super::random_id(PUBLIC_ID_LEN)
}

/// Lifecycle status of a proof.
///
/// `issued -> pending -> {verified, rejected}`. Merchant-issued proofs enter
/// at `verified` directly. A later evidence submission moves any record back
/// to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofStatus {
    Issued,
    Pending,
    Verified,
    Rejected,
}

impl ProofStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofStatus::Issued => "issued",
            ProofStatus::Pending => "pending",
            ProofStatus::Verified => "verified",
            ProofStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "issued" => Some(ProofStatus::Issued),
            "pending" => Some(ProofStatus::Pending),
            "verified" => Some(ProofStatus::Verified),
            "rejected" => Some(ProofStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who created a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuerType {
    /// Self-service customer path; the proof starts unverified.
    User,
    /// Authenticated merchant path; the proof is auto-verified at creation.
    Merchant,
}

impl IssuerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssuerType::User => "user",
            IssuerType::Merchant => "merchant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(IssuerType::User),
            "merchant" => Some(IssuerType::Merchant),
            _ => None,
        }
    }
}

impl fmt::Display for IssuerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to an uploaded evidence file, stored opaquely outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    /// Storage name assigned by the evidence store.
    pub path: String,
    /// MIME type reported at upload time, if any.
    pub mime: Option<String>,
}

/// A proof-of-purchase record.
///
/// `verified_at` is set iff `status == Verified`; `rejected_at` and
/// `rejection_reason` are set iff `status == Rejected`. `proof_hash` is
/// computed once at creation and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proof {
    pub public_id: String,
    pub merchant: String,
    pub item: Option<String>,
    pub proof_hash: String,
    pub status: ProofStatus,
    pub evidence: Option<EvidenceRef>,
    pub evidence_uploaded_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub issuer_type: IssuerType,
    /// Merchant identifier when issued via the merchant path.
    pub issuer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

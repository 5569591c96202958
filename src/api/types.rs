//! Request and response DTOs for the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AuditEvent, IssuerType, Merchant, MerchantApiKey, Proof, ProofStatus};

// ============================================================================
// Proofs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProofRequest {
    pub merchant: String,
    pub reference: String,
    #[serde(default)]
    pub item: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateProofResponse {
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
pub struct IssueProofRequest {
    pub reference: String,
    #[serde(default)]
    pub item: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IssueProofResponse {
    pub public_id: String,
    pub status: ProofStatus,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Public projection of a proof. Never carries raw evidence bytes; the
/// evidence content is an admin-only fetch.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProofResponse {
    pub public_id: String,
    pub merchant: String,
    pub item: Option<String>,
    pub created_at: DateTime<Utc>,
    pub proof_hash: String,
    pub status: ProofStatus,
    pub evidence_uploaded_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub issuer_type: IssuerType,
    pub issuer_id: Option<String>,
}

impl From<Proof> for ProofResponse {
    fn from(p: Proof) -> Self {
        Self {
            public_id: p.public_id,
            merchant: p.merchant,
            item: p.item,
            created_at: p.created_at,
            proof_hash: p.proof_hash,
            status: p.status,
            evidence_uploaded_at: p.evidence_uploaded_at,
            verified_at: p.verified_at,
            rejected_at: p.rejected_at,
            rejection_reason: p.rejection_reason,
            issuer_type: p.issuer_type,
            issuer_id: p.issuer_id,
        }
    }
}

/// Quick validity probe, e.g. for a scanned label.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckProofResponse {
    pub valid: bool,
    pub status: Option<ProofStatus>,
    pub verified_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitEvidenceResponse {
    pub public_id: String,
    pub status: ProofStatus,
}

// ============================================================================
// Admin review
// ============================================================================

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub public_id: String,
    pub status: ProofStatus,
    pub verified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct RejectResponse {
    pub public_id: String,
    pub status: ProofStatus,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuditTrailResponse {
    pub public_id: String,
    pub events: Vec<AuditEvent>,
}

#[derive(Debug, Serialize)]
pub struct EvidenceResponse {
    pub mime: String,
    pub base64: String,
}

// ============================================================================
// Admin session
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

// ============================================================================
// Merchant management
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateMerchantRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct MerchantResponse {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Merchant> for MerchantResponse {
    fn from(m: Merchant) -> Self {
        Self {
            id: m.id,
            name: m.name,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListMerchantsResponse {
    pub merchants: Vec<MerchantResponse>,
}

#[derive(Debug, Deserialize, Default)]
pub struct IssueKeyRequest {
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IssueKeyResponse {
    /// The raw secret. Returned once; it cannot be retrieved later.
    pub secret: String,
    pub key_id: String,
    pub created_at: DateTime<Utc>,
}

/// Key metadata. Never carries the secret or its digest.
#[derive(Debug, Serialize)]
pub struct ApiKeyInfo {
    pub id: String,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub active: bool,
}

impl From<MerchantApiKey> for ApiKeyInfo {
    fn from(k: MerchantApiKey) -> Self {
        let active = k.is_active();
        Self {
            id: k.id,
            label: k.label,
            created_at: k.created_at,
            revoked_at: k.revoked_at,
            active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListKeysResponse {
    pub keys: Vec<ApiKeyInfo>,
}

#[derive(Debug, Serialize)]
pub struct RevokeKeyResponse {
    pub key_id: String,
    pub revoked_at: DateTime<Utc>,
}

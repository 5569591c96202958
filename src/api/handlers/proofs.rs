//! Proof issuance, lookup, and evidence submission.

use axum::extract::{Extension, Multipart, Path, State};
use axum::Json;
use tracing::instrument;

use crate::api::error::{validation_error, ApiError};
use crate::api::handlers::non_empty;
use crate::api::types::{
    CheckProofResponse, CreateProofRequest, CreateProofResponse, IssueProofRequest,
    IssueProofResponse, ProofResponse, SubmitEvidenceResponse,
};
use crate::auth::MerchantContextExt;
use crate::domain::ProofStatus;
use crate::server::AppState;
use crate::store::CoreError;

/// POST /api/v1/proofs - create a proof via the self-service customer path.
#[instrument(skip(state, request), fields(merchant = %request.merchant))]
pub async fn create_proof(
    State(state): State<AppState>,
    Json(request): Json<CreateProofRequest>,
) -> Result<Json<CreateProofResponse>, ApiError> {
    let item = non_empty(request.item);
    let proof = state
        .proofs
        .create_customer_proof(
            request.merchant.trim(),
            request.reference.trim(),
            item.as_deref(),
        )
        .await?;

    Ok(Json(CreateProofResponse {
        public_id: proof.public_id,
    }))
}

/// POST /api/v1/merchant/proofs - issue an auto-verified proof.
///
/// The merchant auth middleware has already resolved the API key; issuance
/// runs under that merchant's identity.
#[instrument(skip(state, request, merchant), fields(merchant_id = %merchant.0.merchant_id))]
pub async fn issue_proof(
    State(state): State<AppState>,
    Extension(merchant): Extension<MerchantContextExt>,
    Json(request): Json<IssueProofRequest>,
) -> Result<Json<IssueProofResponse>, ApiError> {
    let item = non_empty(request.item);
    let proof = state
        .proofs
        .create_merchant_proof(
            &merchant.0.merchant_id,
            &merchant.0.merchant_name,
            request.reference.trim(),
            item.as_deref(),
        )
        .await?;

    Ok(Json(IssueProofResponse {
        public_id: proof.public_id,
        status: proof.status,
        verified_at: proof.verified_at,
    }))
}

/// GET /api/v1/proofs/:public_id - public projection of a proof.
#[instrument(skip(state), fields(public_id = %public_id))]
pub async fn get_proof(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<ProofResponse>, ApiError> {
    let proof = state.proofs.fetch(&public_id).await?;
    Ok(Json(ProofResponse::from(proof)))
}

/// GET /api/v1/proofs/:public_id/check - validity probe.
///
/// Unknown identifiers answer `valid: false` rather than 404 so a scanned
/// label always gets a definite answer.
#[instrument(skip(state), fields(public_id = %public_id))]
pub async fn check_proof(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<CheckProofResponse>, ApiError> {
    match state.proofs.fetch(&public_id).await {
        Ok(proof) => Ok(Json(CheckProofResponse {
            valid: proof.status == ProofStatus::Verified,
            status: Some(proof.status),
            verified_at: proof.verified_at,
            rejected_at: proof.rejected_at,
            rejection_reason: proof.rejection_reason,
        })),
        Err(CoreError::ProofNotFound(_)) => Ok(Json(CheckProofResponse {
            valid: false,
            status: None,
            verified_at: None,
            rejected_at: None,
            rejection_reason: None,
        })),
        Err(e) => Err(e.into()),
    }
}

/// POST /api/v1/proofs/:public_id/evidence - submit an evidence file.
///
/// Multipart upload with a single `file` field. Moves the proof to `pending`
/// per the state machine.
#[instrument(skip(state, multipart), fields(public_id = %public_id))]
pub async fn submit_evidence(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<SubmitEvidenceResponse>, ApiError> {
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| validation_error("file", format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| validation_error("file", format!("failed to read file: {e}")))?;
            file = Some((file_name, content_type, bytes.to_vec()));
        }
    }

    let Some((file_name, content_type, bytes)) = file else {
        return Err(validation_error("file", "file field is required"));
    };
    if bytes.is_empty() {
        return Err(validation_error("file", "file must not be empty"));
    }

    // Reject unknown proofs before writing anything to blob storage.
    state.proofs.fetch(&public_id).await?;

    let stored_name = state
        .evidence
        .store(&public_id, &file_name, &bytes)
        .await?;
    let proof = state
        .proofs
        .submit_evidence(&public_id, &stored_name, content_type.as_deref())
        .await?;

    Ok(Json(SubmitEvidenceResponse {
        public_id: proof.public_id,
        status: proof.status,
    }))
}

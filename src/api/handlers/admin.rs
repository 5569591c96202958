//! Admin session and review handlers.
//!
//! Everything except login/logout sits behind the admin session middleware.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use base64::Engine;
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ErrorCode};
use crate::api::types::{
    AuditTrailResponse, EvidenceResponse, LoginRequest, LoginResponse, RejectRequest,
    RejectResponse, VerifyResponse,
};
use crate::auth::extract_session_token;
use crate::server::AppState;

/// POST /api/v1/admin/login - exchange admin credentials for a session token.
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let credentials = &state.admin;
    let ok = !credentials.password.is_empty()
        && request.username.trim() == credentials.username
        && request.password == credentials.password;

    if !ok {
        warn!(username = %request.username.trim(), "admin login rejected");
        return Err(ApiError::new(
            ErrorCode::InvalidCredentials,
            "invalid credentials",
        ));
    }

    let token = state.sessions.create();
    info!("admin session created");
    Ok(Json(LoginResponse { token }))
}

/// POST /api/v1/admin/logout - invalidate the presented session, if any.
#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    if let Some(token) = extract_session_token(&headers) {
        state.sessions.invalidate(&token);
    }
    Json(serde_json::json!({"success": true}))
}

/// POST /api/v1/admin/proofs/:public_id/verify
#[instrument(skip(state), fields(public_id = %public_id))]
pub async fn verify_proof(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let proof = state.proofs.verify(&public_id).await?;
    Ok(Json(VerifyResponse {
        public_id: proof.public_id,
        status: proof.status,
        verified_at: proof.verified_at,
    }))
}

/// POST /api/v1/admin/proofs/:public_id/reject
#[instrument(skip(state, request), fields(public_id = %public_id))]
pub async fn reject_proof(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<RejectResponse>, ApiError> {
    let proof = state
        .proofs
        .reject(&public_id, request.reason.trim())
        .await?;
    Ok(Json(RejectResponse {
        public_id: proof.public_id,
        status: proof.status,
        rejected_at: proof.rejected_at,
        rejection_reason: proof.rejection_reason,
    }))
}

/// GET /api/v1/admin/proofs/:public_id/audit - ordered audit trail.
#[instrument(skip(state), fields(public_id = %public_id))]
pub async fn audit_trail(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<AuditTrailResponse>, ApiError> {
    // Unknown proofs are a 404, not an empty trail.
    state.proofs.fetch(&public_id).await?;
    let events = state.audit.list_for(&public_id).await?;
    Ok(Json(AuditTrailResponse { public_id, events }))
}

/// GET /api/v1/admin/proofs/:public_id/evidence - evidence content.
///
/// The only place evidence bytes cross the API, and it is admin-only.
#[instrument(skip(state), fields(public_id = %public_id))]
pub async fn get_evidence(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<EvidenceResponse>, ApiError> {
    let proof = state.proofs.fetch(&public_id).await?;
    let Some(evidence) = proof.evidence else {
        return Err(ApiError::new(
            ErrorCode::EvidenceNotFound,
            format!("no evidence stored for proof: {public_id}"),
        ));
    };

    let bytes = state.evidence.load(&evidence.path).await?;
    Ok(Json(EvidenceResponse {
        mime: evidence
            .mime
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        base64: base64::engine::general_purpose::STANDARD.encode(bytes),
    }))
}

//! Admin-side merchant and API-key management.

use axum::extract::{Path, State};
use axum::Json;
use tracing::instrument;

use crate::api::error::ApiError;
use crate::api::handlers::non_empty;
use crate::api::types::{
    ApiKeyInfo, CreateMerchantRequest, IssueKeyRequest, IssueKeyResponse, ListKeysResponse,
    ListMerchantsResponse, MerchantResponse, RevokeKeyResponse,
};
use crate::server::AppState;

/// POST /api/v1/admin/merchants
#[instrument(skip(state, request), fields(name = %request.name))]
pub async fn create_merchant(
    State(state): State<AppState>,
    Json(request): Json<CreateMerchantRequest>,
) -> Result<Json<MerchantResponse>, ApiError> {
    let merchant = state.merchants.create_merchant(request.name.trim()).await?;
    Ok(Json(MerchantResponse::from(merchant)))
}

/// GET /api/v1/admin/merchants
#[instrument(skip(state))]
pub async fn list_merchants(
    State(state): State<AppState>,
) -> Result<Json<ListMerchantsResponse>, ApiError> {
    let merchants = state.merchants.list_merchants().await?;
    Ok(Json(ListMerchantsResponse {
        merchants: merchants.into_iter().map(MerchantResponse::from).collect(),
    }))
}

/// POST /api/v1/admin/merchants/:merchant_id/keys - issue a new API key.
///
/// The response is the only place the raw secret ever appears.
#[instrument(skip(state, request), fields(merchant_id = %merchant_id))]
pub async fn issue_key(
    State(state): State<AppState>,
    Path(merchant_id): Path<String>,
    Json(request): Json<IssueKeyRequest>,
) -> Result<Json<IssueKeyResponse>, ApiError> {
    let label = non_empty(request.label);
    let issued = state
        .merchants
        .issue_key(&merchant_id, label.as_deref())
        .await?;

    Ok(Json(IssueKeyResponse {
        secret: issued.secret,
        key_id: issued.key_id,
        created_at: issued.created_at,
    }))
}

/// GET /api/v1/admin/merchants/:merchant_id/keys - key metadata only.
#[instrument(skip(state), fields(merchant_id = %merchant_id))]
pub async fn list_keys(
    State(state): State<AppState>,
    Path(merchant_id): Path<String>,
) -> Result<Json<ListKeysResponse>, ApiError> {
    let keys = state.merchants.list_keys(&merchant_id).await?;
    Ok(Json(ListKeysResponse {
        keys: keys.into_iter().map(ApiKeyInfo::from).collect(),
    }))
}

/// POST /api/v1/admin/keys/:key_id/revoke - idempotent revocation.
#[instrument(skip(state), fields(key_id = %key_id))]
pub async fn revoke_key(
    State(state): State<AppState>,
    Path(key_id): Path<String>,
) -> Result<Json<RevokeKeyResponse>, ApiError> {
    let revoked_at = state.merchants.revoke_key(&key_id).await?;
    Ok(Json(RevokeKeyResponse { key_id, revoked_at }))
}

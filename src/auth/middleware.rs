//! Authentication middleware for Axum.
//!
//! Both middlewares deny with a uniform 401 before the wrapped handler runs,
//! so authentication always precedes request validation.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{api_key, AuthError, SessionStore};
use crate::store::MerchantStore;

/// Merchant identity resolved from a presented API key.
#[derive(Debug, Clone)]
pub struct MerchantContext {
    pub merchant_id: String,
    pub merchant_name: String,
}

/// Request extension carrying the authenticated merchant.
#[derive(Clone)]
pub struct MerchantContextExt(pub MerchantContext);

/// State for [`merchant_auth_middleware`].
#[derive(Clone)]
pub struct MerchantAuthState {
    pub merchants: Arc<MerchantStore>,
}

/// Authenticate merchant requests via API key.
///
/// Accepts `x-api-key: <secret>` or `Authorization: Bearer <secret>`. Unknown
/// and revoked secrets produce the same response.
pub async fn merchant_auth_middleware(
    State(state): State<MerchantAuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(secret) = extract_api_key(request.headers()) else {
        return auth_error_response(AuthError::MissingAuth);
    };

    match state.merchants.resolve(&secret).await {
        Ok(Some(merchant)) => {
            request.extensions_mut().insert(MerchantContextExt(MerchantContext {
                merchant_id: merchant.id,
                merchant_name: merchant.name,
            }));
            next.run(request).await
        }
        Ok(None) => auth_error_response(AuthError::InvalidApiKey),
        Err(e) => {
            tracing::error!(error = %e, "merchant auth lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(serde_json::json!({
                    "error": "internal error",
                    "code": "INTERNAL_ERROR"
                })),
            )
                .into_response()
        }
    }
}

/// State for [`admin_auth_middleware`].
#[derive(Clone)]
pub struct AdminAuthState {
    pub sessions: Arc<dyn SessionStore>,
}

/// Authenticate admin requests via session token.
pub async fn admin_auth_middleware(
    State(state): State<AdminAuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match extract_session_token(request.headers()) {
        Some(token) if state.sessions.is_valid(&token) => next.run(request).await,
        Some(_) => auth_error_response(AuthError::InvalidSession),
        None => auth_error_response(AuthError::MissingAuth),
    }
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        let key = key.trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }

    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    if let Some(key) = header.strip_prefix("Bearer ") {
        return Some(key.trim().to_string());
    }
    if header.starts_with(api_key::KEY_PREFIX) {
        return Some(header.trim().to_string());
    }
    None
}

/// Pull the admin session token from `Authorization: Bearer` or
/// `x-admin-token`. Also used by the logout handler, which runs outside the
/// session guard.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers.get("x-admin-token").and_then(|v| v.to_str().ok()) {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Convert an auth error to a uniform HTTP response.
fn auth_error_response(error: AuthError) -> Response {
    let message = match error {
        AuthError::MissingAuth => "Missing authentication",
        AuthError::InvalidApiKey => "Invalid API key",
        AuthError::InvalidSession => "Invalid or expired session",
    };

    (
        StatusCode::UNAUTHORIZED,
        axum::Json(serde_json::json!({
            "error": message,
            "code": format!("{error:?}").to_lowercase()
        })),
    )
        .into_response()
}

//! REST API routers.
//!
//! Routes are split by authentication requirement; the server layers the
//! merchant and admin middlewares over their routers when assembling the app.

use axum::routing::{get, post};
use axum::Router;

use crate::api::handlers::{admin, merchants, proofs};
use crate::server::AppState;

/// Unauthenticated routes: customer issuance, lookup, evidence submission,
/// and the admin login/logout pair (logout inspects its own token).
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/v1/proofs", post(proofs::create_proof))
        .route("/v1/proofs/:public_id", get(proofs::get_proof))
        .route("/v1/proofs/:public_id/check", get(proofs::check_proof))
        .route("/v1/proofs/:public_id/evidence", post(proofs::submit_evidence))
        .route("/v1/admin/login", post(admin::login))
        .route("/v1/admin/logout", post(admin::logout))
}

/// Routes behind merchant API-key authentication.
pub fn merchant_router() -> Router<AppState> {
    Router::new().route("/v1/merchant/proofs", post(proofs::issue_proof))
}

/// Routes behind the admin session guard.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/proofs/:public_id/verify", post(admin::verify_proof))
        .route("/v1/admin/proofs/:public_id/reject", post(admin::reject_proof))
        .route("/v1/admin/proofs/:public_id/audit", get(admin::audit_trail))
        .route("/v1/admin/proofs/:public_id/evidence", get(admin::get_evidence))
        .route("/v1/admin/merchants", post(merchants::create_merchant))
        .route("/v1/admin/merchants", get(merchants::list_merchants))
        .route("/v1/admin/merchants/:merchant_id/keys", post(merchants::issue_key))
        .route("/v1/admin/merchants/:merchant_id/keys", get(merchants::list_keys))
        .route("/v1/admin/keys/:key_id/revoke", post(merchants::revoke_key))
}

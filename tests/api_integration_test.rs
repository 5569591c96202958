//! REST API integration tests.
//!
//! These drive the full router (auth middlewares included) with in-process
//! requests; no listening socket is required.

mod common;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use proofdesk::server::build_router;

use common::*;

async fn test_app(dir: &tempfile::TempDir) -> Router {
    let pool = memory_pool().await;
    build_router(test_state(pool, dir.path())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_request(method: Method, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"));
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn multipart_upload(uri: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "proofdesk-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/v1/admin/login",
            json!({"username": TEST_ADMIN_USER, "password": TEST_ADMIN_PASSWORD}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_customer_lifecycle_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    // Create.
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/proofs",
            json!({"merchant": "Acme", "reference": "ORD-1", "item": "Kettle"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let public_id = body["public_id"].as_str().unwrap().to_string();

    // Fetch: issued, no decision fields.
    let (status, body) = send(
        &app,
        Request::get(format!("/api/v1/proofs/{public_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "issued");
    assert_eq!(body["issuer_type"], "user");
    assert!(body["verified_at"].is_null());

    // Upload evidence: pending.
    let (status, body) = send(
        &app,
        multipart_upload(
            &format!("/api/v1/proofs/{public_id}/evidence"),
            "receipt.png",
            "image/png",
            b"fake png bytes",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");

    // Admin verifies.
    let token = login(&app).await;
    let (status, body) = send(
        &app,
        admin_request(
            Method::POST,
            &format!("/api/v1/admin/proofs/{public_id}/verify"),
            &token,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "verified");
    assert!(!body["verified_at"].is_null());

    // Audit trail in order.
    let (status, body) = send(
        &app,
        admin_request(
            Method::GET,
            &format!("/api/v1/admin/proofs/{public_id}/audit"),
            &token,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["proof_created", "evidence_uploaded", "admin_verified"]);

    // Admin evidence fetch round-trips the bytes.
    let (status, body) = send(
        &app,
        admin_request(
            Method::GET,
            &format!("/api/v1/admin/proofs/{public_id}/evidence"),
            &token,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mime"], "image/png");
    use base64::Engine;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(body["base64"].as_str().unwrap())
        .unwrap();
    assert_eq!(decoded, b"fake png bytes");
}

#[tokio::test]
async fn test_create_proof_requires_fields() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/proofs",
            json!({"merchant": "  ", "reference": "ORD-1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], "merchant");
}

#[tokio::test]
async fn test_admin_routes_require_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let (status, _) = send(
        &app,
        Request::post("/api/v1/admin/proofs/abc/verify")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        admin_request(
            Method::POST,
            "/api/v1/admin/proofs/abc/verify",
            "bogus-token",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/admin/login",
            json!({"username": TEST_ADMIN_USER, "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let token = login(&app).await;
    let (status, _) = send(
        &app,
        admin_request(Method::GET, "/api/v1/admin/merchants", &token, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        admin_request(Method::POST, "/api/v1/admin/logout", &token, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        admin_request(Method::GET, "/api/v1/admin/merchants", &token, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_merchant_issue_flow() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;
    let token = login(&app).await;

    // Create merchant and key.
    let (status, body) = send(
        &app,
        admin_request(
            Method::POST,
            "/api/v1/admin/merchants",
            &token,
            Some(json!({"name": "Acme"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let merchant_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        admin_request(
            Method::POST,
            &format!("/api/v1/admin/merchants/{merchant_id}/keys"),
            &token,
            Some(json!({"label": "pos-1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let secret = body["secret"].as_str().unwrap().to_string();
    let key_id = body["key_id"].as_str().unwrap().to_string();
    assert!(secret.starts_with("pd_"));

    // Merchant issues a proof: verified immediately.
    let (status, body) = send(
        &app,
        Request::post("/api/v1/merchant/proofs")
            .header("x-api-key", &secret)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"reference": "ORD-77"}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "verified");
    assert!(!body["verified_at"].is_null());
    let public_id = body["public_id"].as_str().unwrap().to_string();

    // The public check endpoint sees it as valid.
    let (status, body) = send(
        &app,
        Request::get(format!("/api/v1/proofs/{public_id}/check"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    // Audit trail is exactly [proof_created, auto_verified].
    let (_, body) = send(
        &app,
        admin_request(
            Method::GET,
            &format!("/api/v1/admin/proofs/{public_id}/audit"),
            &token,
            None,
        ),
    )
    .await;
    let kinds: Vec<&str> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["proof_created", "auto_verified"]);

    // Key listing shows metadata, never the secret.
    let (_, body) = send(
        &app,
        admin_request(
            Method::GET,
            &format!("/api/v1/admin/merchants/{merchant_id}/keys"),
            &token,
            None,
        ),
    )
    .await;
    let keys = body["keys"].as_array().unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0]["active"], true);
    assert!(keys[0].get("secret").is_none());

    // Revoke, then the key is denied.
    let (status, _) = send(
        &app,
        admin_request(
            Method::POST,
            &format!("/api/v1/admin/keys/{key_id}/revoke"),
            &token,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Request::post("/api/v1/merchant/proofs")
            .header("x-api-key", &secret)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"reference": "ORD-78"}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Second revoke still succeeds.
    let (status, _) = send(
        &app,
        admin_request(
            Method::POST,
            &format!("/api/v1/admin/keys/{key_id}/revoke"),
            &token,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reject_flow_and_guards() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;
    let token = login(&app).await;

    let (_, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/proofs",
            json!({"merchant": "Acme", "reference": "ORD-1"}),
        ),
    )
    .await;
    let public_id = body["public_id"].as_str().unwrap().to_string();

    send(
        &app,
        multipart_upload(
            &format!("/api/v1/proofs/{public_id}/evidence"),
            "receipt.png",
            "image/png",
            b"bytes",
        ),
    )
    .await;

    // Empty reason is rejected before any mutation.
    let (status, body) = send(
        &app,
        admin_request(
            Method::POST,
            &format!("/api/v1/admin/proofs/{public_id}/reject"),
            &token,
            Some(json!({"reason": "  "})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], "reason");

    // Proper rejection.
    let (status, body) = send(
        &app,
        admin_request(
            Method::POST,
            &format!("/api/v1/admin/proofs/{public_id}/reject"),
            &token,
            Some(json!({"reason": "wrong receipt"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["rejection_reason"], "wrong receipt");

    // Verifying a rejected proof is an illegal transition naming the status.
    let (status, body) = send(
        &app,
        admin_request(
            Method::POST,
            &format!("/api/v1/admin/proofs/{public_id}/verify"),
            &token,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ILLEGAL_TRANSITION");
    assert_eq!(body["error"]["details"]["current_status"], "rejected");
}

#[tokio::test]
async fn test_unknown_proof_lookups() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let (status, body) = send(
        &app,
        Request::get("/api/v1/proofs/zzzzzzzz")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "PROOF_NOT_FOUND");

    // The check probe answers definitively instead of 404ing.
    let (status, body) = send(
        &app,
        Request::get("/api/v1/proofs/zzzzzzzz/check")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert!(body["status"].is_null());
}

#[tokio::test]
async fn test_evidence_upload_guards() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    // Unknown proof.
    let (status, _) = send(
        &app,
        multipart_upload(
            "/api/v1/proofs/zzzzzzzz/evidence",
            "receipt.png",
            "image/png",
            b"bytes",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Empty file payload.
    let (_, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/proofs",
            json!({"merchant": "Acme", "reference": "ORD-1"}),
        ),
    )
    .await;
    let public_id = body["public_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        multipart_upload(
            &format!("/api/v1/proofs/{public_id}/evidence"),
            "receipt.png",
            "image/png",
            b"",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], "file");
}

#[tokio::test]
async fn test_health_and_ready() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;

    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
}

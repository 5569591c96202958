//! Structured API error responses with error codes.
//!
//! Every core error is converted at the boundary into a machine-readable
//! code plus a human-readable message. Storage and internal errors are
//! logged with detail and surfaced as a generic failure signal only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::store::CoreError;

/// Error codes for API responses.
///
/// These codes are stable and can be used by clients for programmatic error
/// handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication (1xxx)
    /// No credentials provided
    AuthRequired,
    /// Unknown or revoked API key
    InvalidApiKey,
    /// Missing or expired admin session
    InvalidSession,
    /// Admin login rejected
    InvalidCredentials,

    // Validation (3xxx)
    /// Request body is malformed
    InvalidRequestBody,
    /// Required field is missing or empty
    MissingRequiredField,
    /// Field value is invalid
    InvalidFieldValue,

    // Resources (4xxx)
    /// Proof not found
    ProofNotFound,
    /// Merchant not found
    MerchantNotFound,
    /// API key not found
    KeyNotFound,
    /// No evidence stored for the proof
    EvidenceNotFound,

    // State (7xxx)
    /// Transition attempted outside its guard
    IllegalTransition,

    // Infrastructure (8xxx)
    /// Storage operation failed
    DatabaseError,
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Numeric code for easy categorization.
    pub fn numeric_code(&self) -> u32 {
        match self {
            ErrorCode::AuthRequired => 1001,
            ErrorCode::InvalidApiKey => 1002,
            ErrorCode::InvalidSession => 1003,
            ErrorCode::InvalidCredentials => 1004,

            ErrorCode::InvalidRequestBody => 3001,
            ErrorCode::MissingRequiredField => 3002,
            ErrorCode::InvalidFieldValue => 3003,

            ErrorCode::ProofNotFound => 4001,
            ErrorCode::MerchantNotFound => 4002,
            ErrorCode::KeyNotFound => 4003,
            ErrorCode::EvidenceNotFound => 4004,

            ErrorCode::IllegalTransition => 7001,

            ErrorCode::DatabaseError => 8001,
            ErrorCode::InternalError => 8999,
        }
    }

    /// HTTP status code for this error.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::AuthRequired
            | ErrorCode::InvalidApiKey
            | ErrorCode::InvalidSession
            | ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,

            ErrorCode::InvalidRequestBody
            | ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue => StatusCode::BAD_REQUEST,

            ErrorCode::ProofNotFound
            | ErrorCode::MerchantNotFound
            | ErrorCode::KeyNotFound
            | ErrorCode::EvidenceNotFound => StatusCode::NOT_FOUND,

            ErrorCode::IllegalTransition => StatusCode::CONFLICT,

            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::InvalidApiKey => "INVALID_API_KEY",
            ErrorCode::InvalidSession => "INVALID_SESSION",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InvalidRequestBody => "INVALID_REQUEST_BODY",
            ErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCode::InvalidFieldValue => "INVALID_FIELD_VALUE",
            ErrorCode::ProofNotFound => "PROOF_NOT_FOUND",
            ErrorCode::MerchantNotFound => "MERCHANT_NOT_FOUND",
            ErrorCode::KeyNotFound => "KEY_NOT_FOUND",
            ErrorCode::EvidenceNotFound => "EVIDENCE_NOT_FOUND",
            ErrorCode::IllegalTransition => "ILLEGAL_TRANSITION",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(code)
    }
}

/// Structured error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ErrorDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Numeric error code
    pub numeric_code: u32,

    /// Human-readable message
    pub message: String,

    /// Additional error context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code,
                numeric_code: code.numeric_code(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.error.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code_str = self.error.code.to_string();
        let mut response = (status, Json(self)).into_response();

        if let Ok(code_value) = axum::http::HeaderValue::from_str(&code_str) {
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-error-code"),
                code_value,
            );
        }

        response
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Database(e) => {
                tracing::error!(error = %e, "storage error");
                ApiError::new(ErrorCode::DatabaseError, "storage operation failed")
            }
            CoreError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                ApiError::new(ErrorCode::InternalError, "internal error")
            }
            CoreError::ProofNotFound(id) => {
                ApiError::new(ErrorCode::ProofNotFound, format!("proof not found: {id}"))
            }
            CoreError::MerchantNotFound(id) => ApiError::new(
                ErrorCode::MerchantNotFound,
                format!("merchant not found: {id}"),
            ),
            CoreError::KeyNotFound(id) => {
                ApiError::new(ErrorCode::KeyNotFound, format!("api key not found: {id}"))
            }
            CoreError::EvidenceNotFound(id) => ApiError::new(
                ErrorCode::EvidenceNotFound,
                format!("no evidence stored for proof: {id}"),
            ),
            CoreError::IllegalTransition {
                public_id,
                current,
                attempted,
            } => ApiError::new(
                ErrorCode::IllegalTransition,
                format!("cannot {attempted} proof {public_id} from status '{current}'"),
            )
            .with_details(serde_json::json!({"current_status": current})),
            CoreError::Validation { field, message } => {
                ApiError::new(ErrorCode::MissingRequiredField, message)
                    .with_details(serde_json::json!({"field": field}))
            }
        }
    }
}

/// Validation error with field context, for checks done at the API layer.
pub fn validation_error(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(ErrorCode::InvalidFieldValue, message.into())
        .with_details(serde_json::json!({"field": field}))
}

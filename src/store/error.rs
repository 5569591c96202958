//! Error types for the Proofdesk core.

use thiserror::Error;

/// Errors surfaced by the stores and the state machine.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Proof not found
    #[error("proof not found: {0}")]
    ProofNotFound(String),

    /// Merchant not found
    #[error("merchant not found: {0}")]
    MerchantNotFound(String),

    /// API key not found
    #[error("api key not found: {0}")]
    KeyNotFound(String),

    /// No evidence stored for a proof
    #[error("no evidence stored for proof: {0}")]
    EvidenceNotFound(String),

    /// Transition attempted outside its guard. The message names the
    /// current status for diagnosability.
    #[error("cannot {attempted} proof {public_id} from status '{current}'")]
    IllegalTransition {
        public_id: String,
        current: String,
        attempted: &'static str,
    },

    /// Input rejected before any storage access.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn required(field: &'static str) -> Self {
        CoreError::Validation {
            field,
            message: format!("{field} is required"),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

//! Authentication for Proofdesk.
//!
//! Two independent mechanisms:
//!
//! - **Merchant API keys**: `pd_`-prefixed secrets whose SHA-256 digest is
//!   stored in the database; presented via `x-api-key` or a bearer header.
//!   Unknown and revoked keys are denied identically.
//! - **Admin sessions**: ephemeral tokens issued by login against the
//!   configured admin credentials, held by an externally owned
//!   [`SessionStore`] passed into the router state (no process-wide global).
//!
//! Both middlewares run before any request validation, so authentication is
//! always checked first.

pub mod api_key;
mod middleware;
mod session;

pub use middleware::*;
pub use session::*;

/// Authentication error.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authentication")]
    MissingAuth,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("invalid or expired session")]
    InvalidSession,
}

//! SQLite-backed stores.
//!
//! The stores are the only writers of proof, merchant, key, and audit rows.
//! State transitions go through guarded conditional updates; every
//! state-changing operation commits its audit event in the same transaction.

mod audit;
mod error;
mod merchants;
mod proofs;

pub use audit::*;
pub use error::*;
pub use merchants::*;
pub use proofs::*;

use chrono::{DateTime, Utc};

/// Parse an RFC 3339 timestamp column.
pub(crate) fn parse_ts(field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::Internal(format!("invalid {field} timestamp: {e}")))
}

/// Parse an optional RFC 3339 timestamp column.
pub(crate) fn parse_opt_ts(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_ts(field, v)).transpose()
}

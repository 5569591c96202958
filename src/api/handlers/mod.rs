//! REST API handlers, grouped by resource.

pub mod admin;
pub mod merchants;
pub mod proofs;

/// Trim an optional text field, mapping empty strings to `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

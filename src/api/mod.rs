//! REST API layer: routers, handlers, DTOs, and error mapping.

pub mod error;
pub mod handlers;
mod rest;
pub mod types;

pub use error::{ApiError, ErrorCode};
pub use rest::*;

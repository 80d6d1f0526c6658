//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types used across the
//! entitlement and billing modules.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use ids::CompanyId;
pub use timestamp::Timestamp;

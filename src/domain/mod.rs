//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `entitlement` - Entitlement record, transitions, trial window, status
//! - `billing` - Billing events, signature verification, idempotent dispatch

pub mod billing;
pub mod entitlement;
pub mod foundation;

//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresEntitlementRepository` - Entitlement records, row-locked transitions
//! - `PostgresWebhookEventRepository` - Processed billing event log
//!
//! Schema lives in `migrations/` and is applied at startup with `sqlx::migrate!`.

mod entitlement_repository;
mod webhook_event_repository;

pub use entitlement_repository::PostgresEntitlementRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;

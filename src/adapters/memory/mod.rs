//! In-memory adapters.
//!
//! Port implementations backed by tokio `RwLock`-guarded maps, for tests
//! and for running without a database.

mod entitlement_repository;
mod webhook_event_repository;

pub use entitlement_repository::InMemoryEntitlementRepository;
pub use webhook_event_repository::InMemoryWebhookEventRepository;

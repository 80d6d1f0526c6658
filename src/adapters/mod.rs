//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum routes for webhooks and entitlement queries
//! - `memory` - In-memory repositories for tests and local runs
//! - `postgres` - PostgreSQL repositories
//! - `stripe` - Stripe billing provider client

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;

pub use memory::{InMemoryEntitlementRepository, InMemoryWebhookEventRepository};
pub use postgres::{PostgresEntitlementRepository, PostgresWebhookEventRepository};
pub use stripe::{MockBillingProvider, StripeBillingProvider, StripeConfig};

//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Entitlement Ports
//!
//! - `EntitlementRepository` - Per-company entitlement records
//! - `EntitlementChecker` - The single visibility decision for content paths
//!
//! ## Billing Ports
//!
//! - `BillingProvider` - Outbound customer creation and subscription lookup
//! - `WebhookEventRepository` - Webhook idempotency tracking

mod billing_provider;
mod entitlement_checker;
mod entitlement_repository;
mod webhook_event_repository;

pub use billing_provider::{
    BillingError, BillingErrorCode, BillingProvider, CreateCustomerRequest, Customer,
    SubscriptionDetails,
};
pub use entitlement_checker::EntitlementChecker;
pub use entitlement_repository::EntitlementRepository;
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome,
};

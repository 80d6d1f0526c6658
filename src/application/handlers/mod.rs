//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod entitlement;

pub use entitlement::{
    // Webhook pipeline
    CheckoutCompletedHandler,
    EntitlementWebhookDispatcher,
    HandleBillingWebhookCommand,
    HandleBillingWebhookHandler,
    PruneWebhookEventsCommand,
    PruneWebhookEventsHandler,
    SubscriptionDeletedHandler,
    SubscriptionUpdatedHandler,
    // Lifecycle
    ProvisionCompanyCommand,
    ProvisionCompanyHandler,
    RemoveCompanyCommand,
    RemoveCompanyHandler,
    // Queries
    entitled_at,
    retain_visible,
    EntitlementGate,
    EntitlementView,
    GetEntitlementHandler,
    GetEntitlementQuery,
};

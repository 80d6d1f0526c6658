//! Entitlement handlers.
//!
//! ## Commands
//! - Handling billing webhooks (verify, de-duplicate, dispatch)
//! - Pruning the processed-event log
//! - Provisioning and removing companies
//!
//! ## Queries
//! - Entitlement view for account management
//! - Visibility decisions for content paths (`EntitlementGate`, `retain_visible`)

mod checkout_completed;
mod dispatcher;
mod entitlement_gate;
mod get_entitlement;
mod handle_billing_webhook;
mod provision_company;
mod subscription_deleted;
mod subscription_updated;
mod transition;
mod visibility;

// Transition handlers
pub use checkout_completed::CheckoutCompletedHandler;
pub use dispatcher::EntitlementWebhookDispatcher;
pub use subscription_deleted::SubscriptionDeletedHandler;
pub use subscription_updated::SubscriptionUpdatedHandler;

// Commands
pub use handle_billing_webhook::{
    HandleBillingWebhookCommand, HandleBillingWebhookHandler, PruneWebhookEventsCommand,
    PruneWebhookEventsHandler, MAX_RETENTION_DAYS,
};
pub use provision_company::{
    ProvisionCompanyCommand, ProvisionCompanyHandler, RemoveCompanyCommand, RemoveCompanyHandler,
};

// Queries
pub use entitlement_gate::{entitled_at, EntitlementGate};
pub use get_entitlement::{EntitlementView, GetEntitlementHandler, GetEntitlementQuery};
pub use visibility::retain_visible;

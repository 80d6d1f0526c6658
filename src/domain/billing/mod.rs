//! Billing domain module.
//!
//! Authenticates and routes webhook events from the billing provider.
//!
//! # Module Structure
//!
//! - `billing_event` - Event envelope and the payload objects we read
//! - `webhook_verifier` - HMAC-SHA256 signature verification
//! - `webhook_errors` - Error taxonomy with HTTP status mapping
//! - `webhook_processor` - Idempotent dispatch to transition handlers

mod billing_event;
mod webhook_errors;
mod webhook_processor;
mod webhook_verifier;

#[cfg(test)]
pub use billing_event::BillingEventBuilder;
pub use billing_event::{
    BillingEvent, BillingEventData, BillingEventType, CheckoutSessionObject, PriceObject,
    SubscriptionItem, SubscriptionItems, SubscriptionObject,
};
pub use webhook_errors::WebhookError;
pub use webhook_processor::{
    IdempotentWebhookProcessor, WebhookDispatcher, WebhookEventHandler, WebhookResult,
};
pub use webhook_verifier::{
    sign_payload, BillingWebhookVerifier, SignatureHeader, DEFAULT_MAX_CLOCK_SKEW_SECS,
    DEFAULT_MAX_EVENT_AGE_SECS,
};

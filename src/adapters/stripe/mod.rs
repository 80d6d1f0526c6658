//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` port for Stripe:
//! - Customer creation at company provisioning
//! - Subscription lookup when a checkout completes
//!
//! Webhook verification lives in the billing domain; this module only makes
//! outbound calls.
//!
//! # Security
//!
//! - The API key is held as `secrecy::SecretString` and redacted from `Debug`

mod api_types;
mod mock_billing_provider;
mod stripe_adapter;

pub use api_types::{StripeCustomer, StripeSubscription};
pub use mock_billing_provider::MockBillingProvider;
pub use stripe_adapter::{StripeBillingProvider, StripeConfig};

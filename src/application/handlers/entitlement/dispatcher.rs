//! EntitlementWebhookDispatcher - Routes billing events to transition handlers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::billing::{BillingEventType, WebhookDispatcher, WebhookEventHandler};
use crate::ports::{BillingProvider, EntitlementRepository};

use super::{CheckoutCompletedHandler, SubscriptionDeletedHandler, SubscriptionUpdatedHandler};

/// Dispatcher with one handler per entitlement-changing event type.
///
/// Types without a handler fall through to the default `Ignored` outcome.
pub struct EntitlementWebhookDispatcher {
    checkout_completed: CheckoutCompletedHandler,
    subscription_updated: SubscriptionUpdatedHandler,
    subscription_deleted: SubscriptionDeletedHandler,
}

impl EntitlementWebhookDispatcher {
    pub fn new(
        repository: Arc<dyn EntitlementRepository>,
        billing_provider: Arc<dyn BillingProvider>,
    ) -> Self {
        Self {
            checkout_completed: CheckoutCompletedHandler::new(repository.clone(), billing_provider),
            subscription_updated: SubscriptionUpdatedHandler::new(repository.clone()),
            subscription_deleted: SubscriptionDeletedHandler::new(repository),
        }
    }
}

#[async_trait]
impl WebhookDispatcher for EntitlementWebhookDispatcher {
    fn get_handler(&self, event_type: &BillingEventType) -> Option<&dyn WebhookEventHandler> {
        match event_type {
            BillingEventType::CheckoutCompleted => Some(&self.checkout_completed),
            BillingEventType::SubscriptionUpdated => Some(&self.subscription_updated),
            BillingEventType::SubscriptionDeleted => Some(&self.subscription_deleted),
            BillingEventType::Unknown => None,
        }
    }
}

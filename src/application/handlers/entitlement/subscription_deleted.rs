//! SubscriptionDeletedHandler - Clears the subscription term.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::billing::{
    BillingEvent, BillingEventType, SubscriptionObject, WebhookError, WebhookEventHandler,
};
use crate::domain::entitlement::TermTransition;
use crate::ports::EntitlementRepository;

use super::transition;

/// Handler for `customer.subscription.deleted`.
pub struct SubscriptionDeletedHandler {
    repository: Arc<dyn EntitlementRepository>,
}

impl SubscriptionDeletedHandler {
    pub fn new(repository: Arc<dyn EntitlementRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionDeletedHandler {
    fn handles(&self) -> Vec<BillingEventType> {
        vec![BillingEventType::SubscriptionDeleted]
    }

    async fn handle(&self, event: &BillingEvent) -> Result<(), WebhookError> {
        let subscription: SubscriptionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

        // The period end is not read; a deletion must apply even without one.
        transition::apply(
            self.repository.as_ref(),
            event,
            &subscription.customer,
            TermTransition::Cleared {
                subscription_ref: subscription.id,
            },
        )
        .await
    }
}

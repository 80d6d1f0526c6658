//! SubscriptionUpdatedHandler - Overwrites plan and period end.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::billing::{
    BillingEvent, BillingEventType, SubscriptionObject, WebhookError, WebhookEventHandler,
};
use crate::domain::entitlement::TermTransition;
use crate::ports::EntitlementRepository;

use super::transition;

/// Handler for `customer.subscription.updated`.
pub struct SubscriptionUpdatedHandler {
    repository: Arc<dyn EntitlementRepository>,
}

impl SubscriptionUpdatedHandler {
    pub fn new(repository: Arc<dyn EntitlementRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionUpdatedHandler {
    fn handles(&self) -> Vec<BillingEventType> {
        vec![BillingEventType::SubscriptionUpdated]
    }

    async fn handle(&self, event: &BillingEvent) -> Result<(), WebhookError> {
        let subscription: SubscriptionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

        let period_end = match subscription.raw_period_end() {
            None => return Err(WebhookError::MissingField("current_period_end")),
            Some(raw) => subscription.period_end().ok_or_else(|| {
                WebhookError::MalformedPayload(format!("invalid current_period_end: {}", raw))
            })?,
        };

        transition::apply(
            self.repository.as_ref(),
            event,
            &subscription.customer,
            TermTransition::Renewed {
                plan_ref: subscription.plan_ref(),
                subscription_ref: subscription.id,
                period_end,
            },
        )
        .await
    }
}

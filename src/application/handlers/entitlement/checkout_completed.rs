//! CheckoutCompletedHandler - Records the subscription created by a checkout.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::billing::{
    BillingEvent, BillingEventType, CheckoutSessionObject, WebhookError, WebhookEventHandler,
};
use crate::domain::entitlement::{SubscriptionTerm, TermTransition};
use crate::ports::{BillingProvider, EntitlementRepository};

use super::transition;

/// Handler for `checkout.session.completed`.
///
/// The session only carries refs, so the plan and period end are read from
/// the billing provider before the record is touched.
pub struct CheckoutCompletedHandler {
    repository: Arc<dyn EntitlementRepository>,
    billing_provider: Arc<dyn BillingProvider>,
}

impl CheckoutCompletedHandler {
    pub fn new(
        repository: Arc<dyn EntitlementRepository>,
        billing_provider: Arc<dyn BillingProvider>,
    ) -> Self {
        Self {
            repository,
            billing_provider,
        }
    }
}

#[async_trait]
impl WebhookEventHandler for CheckoutCompletedHandler {
    fn handles(&self) -> Vec<BillingEventType> {
        vec![BillingEventType::CheckoutCompleted]
    }

    async fn handle(&self, event: &BillingEvent) -> Result<(), WebhookError> {
        let session: CheckoutSessionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

        if let Some(mode) = session.mode.as_deref().filter(|m| *m != "subscription") {
            return Err(WebhookError::Ignored(format!(
                "Checkout {} is in {} mode",
                session.id, mode
            )));
        }
        let Some(subscription_ref) = session.subscription else {
            return Err(WebhookError::Ignored(format!(
                "Checkout {} created no subscription",
                session.id
            )));
        };
        let customer_ref = session.customer.ok_or(WebhookError::MissingField("customer"))?;

        // Outbound lookup happens before the record is locked.
        let details = self
            .billing_provider
            .get_subscription(&subscription_ref)
            .await
            .map_err(|e| WebhookError::BillingProviderLookupFailed(e.to_string()))?
            .ok_or_else(|| {
                WebhookError::BillingProviderLookupFailed(format!(
                    "Subscription {} not found",
                    subscription_ref
                ))
            })?;

        if details.customer_ref != customer_ref {
            tracing::warn!(
                event_id = %event.id,
                customer_ref = %customer_ref,
                subscription_customer_ref = %details.customer_ref,
                "Checkout customer differs from subscription customer"
            );
        }

        let term = SubscriptionTerm::new(details.subscription_ref, details.plan_ref, details.period_end);

        transition::apply(
            self.repository.as_ref(),
            event,
            &customer_ref,
            TermTransition::Started(term),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryEntitlementRepository;
    use crate::adapters::stripe::MockBillingProvider;
    use crate::domain::billing::BillingEventBuilder;
    use crate::domain::entitlement::EntitlementRecord;
    use crate::domain::foundation::{CompanyId, Timestamp};
    use crate::ports::{BillingError, SubscriptionDetails};
    use serde_json::json;

    const T0: i64 = 1_709_251_200;

    struct Fixture {
        repo: Arc<InMemoryEntitlementRepository>,
        billing: Arc<MockBillingProvider>,
        handler: CheckoutCompletedHandler,
        company_id: CompanyId,
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryEntitlementRepository::new());
        let billing = Arc::new(MockBillingProvider::new());
        let company_id = CompanyId::new();
        repo.create(&EntitlementRecord::provision(company_id, "cus_1"))
            .await
            .unwrap();
        billing.add_subscription(SubscriptionDetails {
            subscription_ref: "sub_1".to_string(),
            customer_ref: "cus_1".to_string(),
            plan_ref: Some("price_monthly".to_string()),
            period_end: Timestamp::from_unix_secs(T0).unwrap().add_days(30),
        });
        let handler = CheckoutCompletedHandler::new(repo.clone(), billing.clone());
        Fixture {
            repo,
            billing,
            handler,
            company_id,
        }
    }

    fn checkout_event(object: serde_json::Value) -> BillingEvent {
        BillingEventBuilder::new()
            .id("evt_checkout")
            .event_type("checkout.session.completed")
            .created(T0)
            .object(object)
            .build()
    }

    #[tokio::test]
    async fn writes_term_from_provider_lookup() {
        let f = fixture().await;

        f.handler
            .handle(&checkout_event(
                json!({"id": "cs_1", "customer": "cus_1", "subscription": "sub_1"}),
            ))
            .await
            .unwrap();

        let record = f.repo.find_by_company_id(&f.company_id).await.unwrap().unwrap();
        let term = record.subscription.unwrap();
        assert_eq!(term.subscription_ref, "sub_1");
        assert_eq!(term.plan_ref.as_deref(), Some("price_monthly"));
        assert_eq!(
            term.period_end,
            Timestamp::from_unix_secs(T0).unwrap().add_days(30)
        );
    }

    #[tokio::test]
    async fn checkout_without_subscription_is_ignored() {
        let f = fixture().await;

        let result = f
            .handler
            .handle(&checkout_event(json!({"id": "cs_1", "customer": "cus_1"})))
            .await;

        assert!(matches!(result, Err(WebhookError::Ignored(_))));
        assert_eq!(f.billing.call_count("get_subscription"), 0);
    }

    #[tokio::test]
    async fn payment_and_setup_checkouts_are_ignored() {
        let f = fixture().await;
        let before = f.repo.find_by_company_id(&f.company_id).await.unwrap();

        for mode in ["payment", "setup"] {
            let result = f
                .handler
                .handle(&checkout_event(
                    json!({"id": "cs_1", "customer": "cus_1", "mode": mode}),
                ))
                .await;

            assert!(matches!(result, Err(WebhookError::Ignored(_))));
        }
        assert_eq!(f.billing.call_count("get_subscription"), 0);
        assert_eq!(f.repo.find_by_company_id(&f.company_id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn subscription_mode_checkout_is_applied() {
        let f = fixture().await;

        f.handler
            .handle(&checkout_event(json!({
                "id": "cs_1",
                "customer": "cus_1",
                "subscription": "sub_1",
                "mode": "subscription"
            })))
            .await
            .unwrap();

        let record = f.repo.find_by_company_id(&f.company_id).await.unwrap().unwrap();
        assert!(record.subscription.is_some());
    }

    #[tokio::test]
    async fn missing_customer_is_missing_field() {
        let f = fixture().await;

        let result = f
            .handler
            .handle(&checkout_event(json!({"id": "cs_1", "subscription": "sub_1"})))
            .await;

        assert!(matches!(result, Err(WebhookError::MissingField("customer"))));
    }

    #[tokio::test]
    async fn unknown_customer_is_reported() {
        let f = fixture().await;
        f.billing.add_subscription(SubscriptionDetails {
            subscription_ref: "sub_2".to_string(),
            customer_ref: "cus_other".to_string(),
            plan_ref: None,
            period_end: Timestamp::from_unix_secs(T0).unwrap().add_days(30),
        });

        let result = f
            .handler
            .handle(&checkout_event(
                json!({"id": "cs_2", "customer": "cus_other", "subscription": "sub_2"}),
            ))
            .await;

        assert!(matches!(result, Err(WebhookError::CustomerNotFound(ref c)) if c == "cus_other"));
    }

    #[tokio::test]
    async fn lookup_failure_leaves_record_untouched() {
        let f = fixture().await;
        f.billing
            .set_method_error("get_subscription", BillingError::network("timed out"));
        let before = f.repo.find_by_company_id(&f.company_id).await.unwrap();

        let result = f
            .handler
            .handle(&checkout_event(
                json!({"id": "cs_1", "customer": "cus_1", "subscription": "sub_1"}),
            ))
            .await;

        assert!(matches!(result, Err(WebhookError::BillingProviderLookupFailed(_))));
        assert_eq!(f.repo.find_by_company_id(&f.company_id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn unknown_subscription_is_lookup_failure() {
        let f = fixture().await;

        let result = f
            .handler
            .handle(&checkout_event(
                json!({"id": "cs_1", "customer": "cus_1", "subscription": "sub_gone"}),
            ))
            .await;

        assert!(matches!(result, Err(WebhookError::BillingProviderLookupFailed(_))));
    }
}

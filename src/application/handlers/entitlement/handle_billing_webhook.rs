//! HandleBillingWebhookHandler - Command handler for inbound billing webhooks.

use std::sync::Arc;

use crate::domain::billing::{
    BillingWebhookVerifier, IdempotentWebhookProcessor, WebhookDispatcher, WebhookError,
    WebhookResult,
};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::WebhookEventRepository;

/// Command to handle one webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleBillingWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value, if present.
    pub signature: Option<String>,
}

/// Handler for inbound billing webhooks.
///
/// Verification failures short-circuit before any dispatch or write.
pub struct HandleBillingWebhookHandler {
    verifier: BillingWebhookVerifier,
    processor: IdempotentWebhookProcessor,
}

impl HandleBillingWebhookHandler {
    pub fn new(
        verifier: BillingWebhookVerifier,
        webhook_events: Arc<dyn WebhookEventRepository>,
        dispatcher: Arc<dyn WebhookDispatcher>,
    ) -> Self {
        Self {
            verifier,
            processor: IdempotentWebhookProcessor::new(webhook_events, dispatcher),
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleBillingWebhookCommand,
    ) -> Result<WebhookResult, WebhookError> {
        self.handle_at(cmd, Timestamp::now()).await
    }

    /// Handle a delivery, verifying the signature timestamp against `now`.
    pub async fn handle_at(
        &self,
        cmd: HandleBillingWebhookCommand,
        now: Timestamp,
    ) -> Result<WebhookResult, WebhookError> {
        let event = self
            .verifier
            .verify_and_parse_at(&cmd.payload, cmd.signature.as_deref(), now)
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected billing webhook");
                e
            })?;

        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.livemode,
            "Verified billing webhook"
        );

        self.processor.process(&event).await
    }
}

/// Longest retention the prune handler accepts.
pub const MAX_RETENTION_DAYS: i64 = 3650;

/// Command to prune the processed-event log.
#[derive(Debug, Clone, Copy)]
pub struct PruneWebhookEventsCommand {
    pub retention_days: i64,
}

/// Handler that deletes processed-event records past their retention.
pub struct PruneWebhookEventsHandler {
    webhook_events: Arc<dyn WebhookEventRepository>,
}

impl PruneWebhookEventsHandler {
    pub fn new(webhook_events: Arc<dyn WebhookEventRepository>) -> Self {
        Self { webhook_events }
    }

    pub async fn handle(
        &self,
        cmd: PruneWebhookEventsCommand,
    ) -> Result<u64, DomainError> {
        if !(1..=MAX_RETENTION_DAYS).contains(&cmd.retention_days) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Retention must be between 1 and {} days", MAX_RETENTION_DAYS),
            ));
        }
        let cutoff = Timestamp::now().add_days(-cmd.retention_days);
        let deleted = self
            .webhook_events
            .delete_before(*cutoff.as_datetime())
            .await?;
        if deleted > 0 {
            tracing::info!(deleted, retention_days = cmd.retention_days, "Pruned webhook events");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryEntitlementRepository, InMemoryWebhookEventRepository};
    use crate::adapters::stripe::MockBillingProvider;
    use crate::application::handlers::entitlement::EntitlementWebhookDispatcher;
    use crate::domain::billing::sign_payload;
    use crate::domain::entitlement::{EntitlementRecord, SubscriptionTerm, TermTransition};
    use crate::domain::foundation::CompanyId;
    use crate::ports::{EntitlementRepository, WebhookEventRecord};
    use secrecy::SecretString;
    use serde_json::json;

    const SECRET: &str = "whsec_unit";
    const T0: i64 = 1_709_251_200;

    struct Fixture {
        handler: HandleBillingWebhookHandler,
        entitlements: Arc<InMemoryEntitlementRepository>,
        webhook_events: Arc<InMemoryWebhookEventRepository>,
    }

    async fn fixture() -> Fixture {
        let entitlements = Arc::new(InMemoryEntitlementRepository::new());
        let webhook_events = Arc::new(InMemoryWebhookEventRepository::new());
        entitlements
            .create(&EntitlementRecord::provision(CompanyId::new(), "cus_1"))
            .await
            .unwrap();
        entitlements
            .apply_transition(
                "cus_1",
                &TermTransition::Started(SubscriptionTerm::new(
                    "sub_1",
                    Some("price_monthly".to_string()),
                    Timestamp::from_unix_secs(T0).unwrap().add_days(30),
                )),
                Timestamp::from_unix_secs(T0).unwrap(),
            )
            .await
            .unwrap();
        let dispatcher = Arc::new(EntitlementWebhookDispatcher::new(
            entitlements.clone(),
            Arc::new(MockBillingProvider::new()),
        ));
        let handler = HandleBillingWebhookHandler::new(
            BillingWebhookVerifier::new(SecretString::new(SECRET.to_string())),
            webhook_events.clone(),
            dispatcher,
        );
        Fixture {
            handler,
            entitlements,
            webhook_events,
        }
    }

    fn deleted_payload() -> String {
        json!({
            "id": "evt_del",
            "type": "customer.subscription.deleted",
            "created": T0 + 60,
            "data": {"object": {"id": "sub_1", "customer": "cus_1", "current_period_end": T0}}
        })
        .to_string()
    }

    fn signed(payload: &str) -> HandleBillingWebhookCommand {
        HandleBillingWebhookCommand {
            payload: payload.as_bytes().to_vec(),
            signature: Some(format!("t={},v1={}", T0, sign_payload(SECRET, T0, payload))),
        }
    }

    fn now() -> Timestamp {
        Timestamp::from_unix_secs(T0).unwrap()
    }

    #[tokio::test]
    async fn verified_event_is_processed() {
        let f = fixture().await;

        let result = f.handler.handle_at(signed(&deleted_payload()), now()).await.unwrap();

        assert_eq!(result, WebhookResult::Processed);
        let record = f.entitlements.find_by_customer_ref("cus_1").await.unwrap().unwrap();
        assert!(record.subscription.is_none());
    }

    #[tokio::test]
    async fn tampered_signature_never_reaches_a_handler() {
        let f = fixture().await;
        let before = f.entitlements.snapshot().await;
        let mut cmd = signed(&deleted_payload());
        cmd.payload = deleted_payload().replace("evt_del", "evt_forged").into_bytes();

        let result = f.handler.handle_at(cmd, now()).await;

        assert!(matches!(result, Err(WebhookError::SignatureInvalid)));
        assert_eq!(f.entitlements.snapshot().await, before);
        assert!(f.webhook_events.is_empty().await);
    }

    #[tokio::test]
    async fn missing_signature_is_rejected() {
        let f = fixture().await;
        let cmd = HandleBillingWebhookCommand {
            payload: deleted_payload().into_bytes(),
            signature: None,
        };

        let result = f.handler.handle_at(cmd, now()).await;

        assert!(matches!(result, Err(WebhookError::SignatureMissing)));
    }

    #[tokio::test]
    async fn redelivery_is_already_processed() {
        let f = fixture().await;

        f.handler.handle_at(signed(&deleted_payload()), now()).await.unwrap();
        let second = f.handler.handle_at(signed(&deleted_payload()), now()).await.unwrap();

        assert_eq!(second, WebhookResult::AlreadyProcessed);
    }

    #[tokio::test]
    async fn prune_removes_expired_records() {
        let repo = Arc::new(InMemoryWebhookEventRepository::new());
        let mut old = WebhookEventRecord::success("evt_old", "type", json!({}));
        old.processed_at = chrono::Utc::now() - chrono::Duration::days(45);
        repo.save(old).await.unwrap();
        repo.save(WebhookEventRecord::success("evt_new", "type", json!({})))
            .await
            .unwrap();
        let handler = PruneWebhookEventsHandler::new(repo.clone());

        let deleted = handler
            .handle(PruneWebhookEventsCommand { retention_days: 30 })
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn prune_rejects_out_of_range_retention() {
        let repo = Arc::new(InMemoryWebhookEventRepository::new());
        repo.save(WebhookEventRecord::success("evt_1", "type", json!({})))
            .await
            .unwrap();
        let handler = PruneWebhookEventsHandler::new(repo.clone());

        for retention_days in [0, i64::MAX] {
            let err = handler
                .handle(PruneWebhookEventsCommand { retention_days })
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationFailed);
        }
        assert_eq!(repo.len().await, 1);
    }
}

//! Webhook processor - Orchestrates idempotent webhook event handling.
//!
//! Sits between signature verification and the transition handlers and makes
//! sure each provider event id is dispatched at most once to a successful end.
//!
//! ## Design
//!
//! The processor follows these steps:
//! 1. Check if the event id was already recorded (idempotency)
//! 2. Dispatch to the handler registered for the event type
//! 3. Record successful and ignored outcomes; leave failures unrecorded so
//!    the provider's redelivery is attempted again
//!
//! ## Race Condition Handling
//!
//! When multiple deliveries of one event arrive simultaneously:
//! - First to save wins (PRIMARY KEY on the event id)
//! - Others get `AlreadyExists` and return `AlreadyProcessed`

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

use super::billing_event::{BillingEvent, BillingEventType};
use super::webhook_errors::WebhookError;

/// Handler for a specific type of billing webhook event.
///
/// Implementations focus on a single event type and perform one write.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Returns the event type(s) this handler processes.
    fn handles(&self) -> Vec<BillingEventType>;

    /// Handles the webhook event.
    ///
    /// Returns `Ok(())` on success.
    /// Returns `Err(WebhookError::Ignored(_))` if event should be acknowledged but not applied.
    /// Returns other `Err` variants for actual failures.
    async fn handle(&self, event: &BillingEvent) -> Result<(), WebhookError>;
}

/// Dispatches webhook events to the appropriate handler.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    /// Find a handler for the given event type.
    ///
    /// Returns `None` if no handler is registered for this event type.
    fn get_handler(&self, event_type: &BillingEventType) -> Option<&dyn WebhookEventHandler>;

    /// Dispatch an event to its handler.
    ///
    /// Returns `Err(WebhookError::Ignored)` if no handler is registered.
    async fn dispatch(&self, event: &BillingEvent) -> Result<(), WebhookError> {
        let event_type = event.parsed_type();
        match self.get_handler(&event_type) {
            Some(handler) => handler.handle(event).await,
            None => Err(WebhookError::Ignored(format!(
                "No handler for event type: {}",
                event.event_type
            ))),
        }
    }
}

/// Result of webhook processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookResult {
    /// Event was applied.
    Processed,
    /// Event was acknowledged without changing state.
    Ignored,
    /// Event id was already recorded (idempotent skip).
    AlreadyProcessed,
}

/// Processes webhook events with idempotency guarantees.
pub struct IdempotentWebhookProcessor {
    repository: Arc<dyn WebhookEventRepository>,
    dispatcher: Arc<dyn WebhookDispatcher>,
}

impl IdempotentWebhookProcessor {
    /// Creates a new processor with the given repository and dispatcher.
    pub fn new(
        repository: Arc<dyn WebhookEventRepository>,
        dispatcher: Arc<dyn WebhookDispatcher>,
    ) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Process a verified webhook event at most once.
    ///
    /// # Returns
    ///
    /// - `Ok(WebhookResult::Processed)` - Event was applied
    /// - `Ok(WebhookResult::Ignored)` - Event was acknowledged and recorded without effect
    /// - `Ok(WebhookResult::AlreadyProcessed)` - Event id already recorded
    /// - `Err(_)` - Handling failed; nothing was recorded
    pub async fn process(&self, event: &BillingEvent) -> Result<WebhookResult, WebhookError> {
        if self.repository.find_by_event_id(&event.id).await?.is_some() {
            tracing::info!(
                event_id = %event.id,
                event_type = %event.event_type,
                "Skipping already processed billing event"
            );
            return Ok(WebhookResult::AlreadyProcessed);
        }

        let (record, result) = match self.dispatcher.dispatch(event).await {
            Ok(()) => (
                WebhookEventRecord::success(&event.id, &event.event_type, payload_of(event)?),
                WebhookResult::Processed,
            ),
            Err(WebhookError::Ignored(reason)) => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    reason = %reason,
                    "Billing event ignored"
                );
                (
                    WebhookEventRecord::ignored(
                        &event.id,
                        &event.event_type,
                        reason,
                        payload_of(event)?,
                    ),
                    WebhookResult::Ignored,
                )
            }
            Err(e) => {
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Billing event handling failed"
                );
                return Err(e);
            }
        };

        match self.repository.save(record).await? {
            SaveResult::Inserted => Ok(result),
            SaveResult::AlreadyExists => Ok(WebhookResult::AlreadyProcessed),
        }
    }
}

fn payload_of(event: &BillingEvent) -> Result<serde_json::Value, WebhookError> {
    serde_json::to_value(event)
        .map_err(|e| WebhookError::MalformedPayload(format!("Failed to serialize event: {}", e)))
}

/// Converts DomainError to WebhookError for repository operations.
impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::BillingEventBuilder;
    use crate::ports::WebhookOutcome;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::RwLock;

    // ══════════════════════════════════════════════════════════════
    // Test Infrastructure
    // ══════════════════════════════════════════════════════════════

    struct MockWebhookRepository {
        records: RwLock<HashMap<String, WebhookEventRecord>>,
    }

    impl MockWebhookRepository {
        fn new() -> Self {
            Self {
                records: RwLock::new(HashMap::new()),
            }
        }

        async fn len(&self) -> usize {
            self.records.read().await.len()
        }
    }

    #[async_trait]
    impl WebhookEventRepository for MockWebhookRepository {
        async fn find_by_event_id(
            &self,
            event_id: &str,
        ) -> Result<Option<WebhookEventRecord>, DomainError> {
            Ok(self.records.read().await.get(event_id).cloned())
        }

        async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
            let mut records = self.records.write().await;
            if records.contains_key(&record.event_id) {
                Ok(SaveResult::AlreadyExists)
            } else {
                records.insert(record.event_id.clone(), record);
                Ok(SaveResult::Inserted)
            }
        }

        async fn delete_before(
            &self,
            timestamp: chrono::DateTime<chrono::Utc>,
        ) -> Result<u64, DomainError> {
            let mut records = self.records.write().await;
            let before = records.len();
            records.retain(|_, r| r.processed_at >= timestamp);
            Ok((before - records.len()) as u64)
        }
    }

    enum Behaviour {
        Succeed,
        Fail,
        Ignore,
    }

    struct MockHandler {
        handles_types: Vec<BillingEventType>,
        call_count: AtomicU32,
        behaviour: Behaviour,
    }

    impl MockHandler {
        fn new(handles: Vec<BillingEventType>, behaviour: Behaviour) -> Self {
            Self {
                handles_types: handles,
                call_count: AtomicU32::new(0),
                behaviour,
            }
        }

        fn call_count(&self) -> u32 {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WebhookEventHandler for MockHandler {
        fn handles(&self) -> Vec<BillingEventType> {
            self.handles_types.clone()
        }

        async fn handle(&self, _event: &BillingEvent) -> Result<(), WebhookError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Succeed => Ok(()),
                Behaviour::Fail => Err(WebhookError::Database("Simulated failure".to_string())),
                Behaviour::Ignore => Err(WebhookError::Ignored("Test ignore".to_string())),
            }
        }
    }

    struct SingleHandlerDispatcher {
        handler: Arc<MockHandler>,
    }

    #[async_trait]
    impl WebhookDispatcher for SingleHandlerDispatcher {
        fn get_handler(&self, event_type: &BillingEventType) -> Option<&dyn WebhookEventHandler> {
            if self.handler.handles_types.contains(event_type) {
                Some(self.handler.as_ref())
            } else {
                None
            }
        }
    }

    fn setup(
        behaviour: Behaviour,
    ) -> (
        IdempotentWebhookProcessor,
        Arc<MockWebhookRepository>,
        Arc<MockHandler>,
    ) {
        let repo = Arc::new(MockWebhookRepository::new());
        let handler = Arc::new(MockHandler::new(
            vec![BillingEventType::SubscriptionUpdated],
            behaviour,
        ));
        let dispatcher = Arc::new(SingleHandlerDispatcher {
            handler: handler.clone(),
        });
        (
            IdempotentWebhookProcessor::new(repo.clone(), dispatcher),
            repo,
            handler,
        )
    }

    fn test_event(id: &str, event_type: &str) -> BillingEvent {
        BillingEventBuilder::new().id(id).event_type(event_type).build()
    }

    // ══════════════════════════════════════════════════════════════
    // Dispatcher Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn dispatch_without_handler_is_ignored() {
        let handler = Arc::new(MockHandler::new(vec![], Behaviour::Succeed));
        let dispatcher = SingleHandlerDispatcher { handler };

        let result = dispatcher
            .dispatch(&test_event("evt_1", "invoice.paid"))
            .await;

        assert!(matches!(result, Err(WebhookError::Ignored(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Processor Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn processes_new_event_and_records_success() {
        let (processor, repo, handler) = setup(Behaviour::Succeed);

        let result = processor
            .process(&test_event("evt_1", "customer.subscription.updated"))
            .await
            .unwrap();

        assert_eq!(result, WebhookResult::Processed);
        assert_eq!(handler.call_count(), 1);
        let record = repo.find_by_event_id("evt_1").await.unwrap().unwrap();
        assert_eq!(record.outcome, WebhookOutcome::Success);
    }

    #[tokio::test]
    async fn duplicate_event_is_dispatched_once() {
        let (processor, _repo, handler) = setup(Behaviour::Succeed);
        let event = test_event("evt_dup", "customer.subscription.updated");

        let first = processor.process(&event).await.unwrap();
        let second = processor.process(&event).await.unwrap();

        assert_eq!(first, WebhookResult::Processed);
        assert_eq!(second, WebhookResult::AlreadyProcessed);
        assert_eq!(handler.call_count(), 1);
    }

    #[tokio::test]
    async fn unknown_event_type_is_recorded_as_ignored() {
        let (processor, repo, handler) = setup(Behaviour::Succeed);

        let result = processor
            .process(&test_event("evt_unknown", "invoice.created"))
            .await
            .unwrap();

        assert_eq!(result, WebhookResult::Ignored);
        assert_eq!(handler.call_count(), 0);
        let record = repo.find_by_event_id("evt_unknown").await.unwrap().unwrap();
        assert_eq!(record.outcome, WebhookOutcome::Ignored);
    }

    #[tokio::test]
    async fn handler_ignore_is_recorded() {
        let (processor, repo, _handler) = setup(Behaviour::Ignore);

        let result = processor
            .process(&test_event("evt_ign", "customer.subscription.updated"))
            .await
            .unwrap();

        assert_eq!(result, WebhookResult::Ignored);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn failed_event_is_not_recorded_and_can_be_retried() {
        let (processor, repo, handler) = setup(Behaviour::Fail);
        let event = test_event("evt_fail", "customer.subscription.updated");

        let first = processor.process(&event).await;
        let second = processor.process(&event).await;

        assert!(matches!(first, Err(WebhookError::Database(_))));
        assert!(matches!(second, Err(WebhookError::Database(_))));
        assert_eq!(handler.call_count(), 2);
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn losing_save_race_reports_already_processed() {
        let (processor, repo, _handler) = setup(Behaviour::Succeed);
        let event = test_event("evt_race", "customer.subscription.updated");

        // Lookup never sees the record, as if another delivery committed after it.
        struct RacingRepo(Arc<MockWebhookRepository>);

        #[async_trait]
        impl WebhookEventRepository for RacingRepo {
            async fn find_by_event_id(
                &self,
                _event_id: &str,
            ) -> Result<Option<WebhookEventRecord>, DomainError> {
                Ok(None)
            }

            async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
                self.0.save(record).await
            }

            async fn delete_before(
                &self,
                timestamp: chrono::DateTime<chrono::Utc>,
            ) -> Result<u64, DomainError> {
                self.0.delete_before(timestamp).await
            }
        }

        processor.process(&event).await.unwrap();
        let handler = Arc::new(MockHandler::new(
            vec![BillingEventType::SubscriptionUpdated],
            Behaviour::Succeed,
        ));
        let racing = IdempotentWebhookProcessor::new(
            Arc::new(RacingRepo(repo)),
            Arc::new(SingleHandlerDispatcher { handler }),
        );

        let result = racing.process(&event).await.unwrap();

        assert_eq!(result, WebhookResult::AlreadyProcessed);
    }

    #[test]
    fn domain_error_converts_to_database_error() {
        let err: WebhookError = DomainError::database("connection refused").into();
        assert!(matches!(err, WebhookError::Database(_)));
    }
}

//! Shared write path for the transition handlers.

use crate::domain::billing::{BillingEvent, WebhookError};
use crate::domain::entitlement::{ApplyOutcome, TermTransition};
use crate::domain::foundation::{ErrorCode, Timestamp};
use crate::ports::EntitlementRepository;

/// Creation time of the event, required for ordering.
pub(super) fn event_time(event: &BillingEvent) -> Result<Timestamp, WebhookError> {
    event
        .created_at()
        .ok_or_else(|| WebhookError::MalformedPayload(format!("invalid created: {}", event.created)))
}

/// Apply `transition` to the record matched by `customer_ref`.
///
/// Skipped transitions surface as `WebhookError::Ignored` so they are
/// acknowledged and recorded without a state change.
pub(super) async fn apply(
    repository: &dyn EntitlementRepository,
    event: &BillingEvent,
    customer_ref: &str,
    transition: TermTransition,
) -> Result<(), WebhookError> {
    let event_at = event_time(event)?;

    let outcome = repository
        .apply_transition(customer_ref, &transition, event_at)
        .await
        .map_err(|e| match e.code {
            ErrorCode::CustomerNotFound => WebhookError::CustomerNotFound(customer_ref.to_string()),
            _ => WebhookError::Database(e.to_string()),
        })?;

    match outcome {
        ApplyOutcome::Applied => {
            tracing::info!(
                event_id = %event.id,
                event_type = %event.event_type,
                customer_ref,
                transition = transition.name(),
                "Entitlement updated"
            );
            Ok(())
        }
        ApplyOutcome::SkippedStale => Err(WebhookError::Ignored(format!(
            "Event {} is older than the last applied event",
            event.id
        ))),
        ApplyOutcome::SkippedNoSubscription => Err(WebhookError::Ignored(format!(
            "Customer {} has no subscription to update",
            customer_ref
        ))),
        ApplyOutcome::SkippedOtherSubscription => Err(WebhookError::Ignored(format!(
            "Event {} names a subscription customer {} no longer holds",
            event.id, customer_ref
        ))),
    }
}

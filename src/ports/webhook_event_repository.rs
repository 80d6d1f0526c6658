//! WebhookEventRepository port - Log of billing events already handled.
//!
//! Enables idempotent webhook handling by remembering which provider event
//! ids have been applied or deliberately ignored. Failed attempts are never
//! written here, so the provider's redelivery is handled again.
//!
//! The provider may deliver the same event several times due to:
//! - Network timeouts
//! - A 5xx response from our endpoint
//! - Our 2xx response never reaching the provider

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// How a recorded event was disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Success,
    Ignored,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Success => "success",
            WebhookOutcome::Ignored => "ignored",
        }
    }

    /// Parse a stored outcome string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(WebhookOutcome::Success),
            "ignored" => Some(WebhookOutcome::Ignored),
            _ => None,
        }
    }
}

/// Record of a handled webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Provider event ID (evt_xxx format).
    pub event_id: String,

    /// Provider event type tag (e.g., "checkout.session.completed").
    pub event_type: String,

    /// When the event was handled.
    pub processed_at: DateTime<Utc>,

    pub outcome: WebhookOutcome,

    /// Why the event was ignored, if it was.
    pub reason: Option<String>,

    /// Original event payload for auditing.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    /// Creates a new success record.
    pub fn success(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: WebhookOutcome::Success,
            reason: None,
            payload,
        }
    }

    /// Creates a new ignored record.
    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: WebhookOutcome::Ignored,
            reason: Some(reason.into()),
            payload,
        }
    }
}

/// Result of attempting to save a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first time seeing this event).
    Inserted,
    /// Record already exists (duplicate event).
    AlreadyExists,
}

/// Port for storing and retrieving handled webhook events.
///
/// Implementations should use a PRIMARY KEY on event_id so that concurrent
/// deliveries of one event race safely.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Find a previously handled event by its provider event ID.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Attempt to save a webhook event record.
    ///
    /// Returns `SaveResult::AlreadyExists` if another delivery already inserted it.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Delete records processed before the given instant. Returns the number deleted.
    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError>;
}

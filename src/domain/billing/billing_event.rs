//! Billing provider webhook event types.
//!
//! Defines the structures for parsing Stripe-format webhook payloads.
//! Only fields relevant to entitlement sync are captured.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Billing webhook event (simplified).
///
/// Additional fields from the provider's full event schema are ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type tag of the event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: BillingEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,

    /// Previous values for updated attributes (only for update events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<serde_json::Value>,
}

impl BillingEvent {
    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> BillingEventType {
        BillingEventType::from_type_tag(&self.event_type)
    }

    /// Creation time of the event, used for ordering.
    pub fn created_at(&self) -> Option<Timestamp> {
        Timestamp::from_unix_secs(self.created)
    }

    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}

/// Event types that change entitlement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillingEventType {
    /// Checkout session completed; a subscription now exists.
    CheckoutCompleted,
    /// Subscription plan or period changed.
    SubscriptionUpdated,
    /// Subscription ended.
    SubscriptionDeleted,
    /// Anything else. Accepted and ignored.
    Unknown,
}

impl BillingEventType {
    /// Parse event type from the provider's type tag.
    pub fn from_type_tag(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutCompleted,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            _ => Self::Unknown,
        }
    }

    /// Convert to the provider's type tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutCompleted => "checkout.session.completed",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::Unknown => "unknown",
        }
    }
}

/// `data.object` of a `checkout.session.completed` event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutSessionObject {
    pub id: String,

    /// Customer reference. Absent for guest checkouts.
    #[serde(default)]
    pub customer: Option<String>,

    /// Subscription reference. Absent for one-off payments.
    #[serde(default)]
    pub subscription: Option<String>,

    #[serde(default)]
    pub mode: Option<String>,
}

/// `data.object` of a `customer.subscription.*` event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub customer: String,

    #[serde(default)]
    pub status: Option<String>,

    /// End of the current paid period (Unix timestamp). Newer API versions
    /// carry it on the items instead.
    #[serde(default)]
    pub current_period_end: Option<i64>,

    #[serde(default)]
    pub items: SubscriptionItems,
}

/// Line items attached to a subscription.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionItem {
    #[serde(default)]
    pub id: Option<String>,
    pub price: PriceObject,

    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceObject {
    pub id: String,
}

impl SubscriptionObject {
    /// Price reference of the first line item.
    pub fn plan_ref(&self) -> Option<String> {
        self.items.data.first().map(|item| item.price.id.clone())
    }

    /// Raw period end: the subscription's own, else the first item's.
    pub fn raw_period_end(&self) -> Option<i64> {
        self.current_period_end
            .or_else(|| self.items.data.iter().find_map(|item| item.current_period_end))
    }

    /// End of the current paid period. `None` if absent or out of range.
    pub fn period_end(&self) -> Option<Timestamp> {
        self.raw_period_end().and_then(Timestamp::from_unix_secs)
    }
}

/// Builder for creating test BillingEvent instances.
#[cfg(test)]
pub struct BillingEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
}

#[cfg(test)]
impl Default for BillingEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
        }
    }
}

#[cfg(test)]
impl BillingEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn build(self) -> BillingEvent {
        BillingEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: BillingEventData {
                object: self.object,
                previous_attributes: None,
            },
            livemode: false,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}

//! Stripe REST response bodies read by the billing adapter.
//!
//! Only the fields entitlement sync consumes are modelled; everything else in
//! the response is ignored by serde.

use serde::Deserialize;

use crate::domain::foundation::Timestamp;
use crate::ports::{BillingError, Customer, SubscriptionDetails};

/// `POST /v1/customers` response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    /// Customer ID (cus_...).
    pub id: String,

    pub email: Option<String>,

    /// Set on customers removed from the dashboard.
    #[serde(default)]
    pub deleted: bool,
}

impl From<StripeCustomer> for Customer {
    fn from(customer: StripeCustomer) -> Self {
        Customer {
            id: customer.id,
            email: customer.email,
        }
    }
}

/// `GET /v1/subscriptions/{id}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    /// Subscription ID (sub_...).
    pub id: String,

    /// Owning customer ID.
    pub customer: String,

    #[serde(default)]
    pub status: Option<String>,

    /// Current period end (Unix seconds). Newer API versions carry it on
    /// the items instead.
    #[serde(default)]
    pub current_period_end: Option<i64>,

    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub price: StripePrice,

    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    /// Price ID (price_...).
    pub id: String,
}

impl StripeSubscription {
    /// Convert to the port's view of a subscription.
    ///
    /// The first item's price is the plan.
    pub fn into_details(self) -> Result<SubscriptionDetails, BillingError> {
        let raw = self
            .current_period_end
            .or_else(|| {
                self.items
                    .data
                    .iter()
                    .find_map(|item| item.current_period_end)
            })
            .ok_or_else(|| BillingError::invalid_response("subscription has no current_period_end"))?;
        let period_end = Timestamp::from_unix_secs(raw).ok_or_else(|| {
            BillingError::invalid_response(format!("current_period_end out of range: {}", raw))
        })?;

        Ok(SubscriptionDetails {
            plan_ref: self.items.data.first().map(|item| item.price.id.clone()),
            subscription_ref: self.id,
            customer_ref: self.customer,
            period_end,
        })
    }
}

/// Stripe error envelope: `{"error": {"type": ..., "code": ..., "message": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    #[serde(rename = "type")]
    pub error_type: Option<String>,

    pub code: Option<String>,

    pub message: Option<String>,
}

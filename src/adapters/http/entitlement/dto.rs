//! Data Transfer Objects for entitlement HTTP endpoints.
//!
//! These types define the JSON shapes for API responses.

use serde::{Deserialize, Serialize};

use crate::application::handlers::EntitlementView;
use crate::domain::billing::WebhookResult;
use crate::domain::entitlement::{EntitlementRecord, EntitlementStatus};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to provision billing for a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionCompanyRequest {
    /// Billing contact email for the provider customer.
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Result of provisioning a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionCompanyResponse {
    pub company_id: String,
    pub customer_ref: String,
}

impl From<EntitlementRecord> for ProvisionCompanyResponse {
    fn from(record: EntitlementRecord) -> Self {
        Self {
            company_id: record.company_id.to_string(),
            customer_ref: record.customer_ref,
        }
    }
}

/// Acknowledgement returned to the billing provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAckResponse {
    pub received: bool,
    /// `processed`, `ignored` or `duplicate`.
    pub outcome: String,
}

impl From<WebhookResult> for WebhookAckResponse {
    fn from(result: WebhookResult) -> Self {
        let outcome = match result {
            WebhookResult::Processed => "processed",
            WebhookResult::Ignored => "ignored",
            WebhookResult::AlreadyProcessed => "duplicate",
        };
        Self {
            received: true,
            outcome: outcome.to_string(),
        }
    }
}

/// Entitlement view for account management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementResponse {
    pub company_id: String,
    pub customer_ref: String,
    pub subscription_ref: Option<String>,
    pub plan_ref: Option<String>,
    /// RFC 3339.
    pub period_end: Option<String>,
    pub status: EntitlementStatus,
    pub entitled: bool,
}

impl From<EntitlementView> for EntitlementResponse {
    fn from(view: EntitlementView) -> Self {
        Self {
            company_id: view.company_id.to_string(),
            customer_ref: view.customer_ref,
            subscription_ref: view.subscription_ref,
            plan_ref: view.plan_ref,
            period_end: view.period_end.map(|t| t.as_datetime().to_rfc3339()),
            status: view.status,
            entitled: view.entitled,
        }
    }
}

/// Answer for content services asking whether a company may be shown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityResponse {
    pub company_id: String,
    pub visible: bool,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

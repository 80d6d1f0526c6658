//! Billing provider port for the external system of record.
//!
//! Covers the two calls entitlement sync makes outbound: creating the
//! customer when a company is provisioned, and reading a subscription when a
//! checkout completes.
//!
//! # Design
//!
//! - **Provider agnostic**: Interface works with any subscription billing provider
//! - **Idempotent**: Customer creation carries an idempotency key
//! - **Bounded**: Implementations time out and retry at most once

use crate::domain::foundation::{CompanyId, DomainError, ErrorCode, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for billing provider integrations.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Create a customer in the billing system.
    ///
    /// Returns the provider's customer record.
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, BillingError>;

    /// Get subscription details by provider ref.
    ///
    /// Returns `Ok(None)` if the provider does not know the subscription.
    async fn get_subscription(
        &self,
        subscription_ref: &str,
    ) -> Result<Option<SubscriptionDetails>, BillingError>;
}

/// Request to create a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    /// Local company id (stored as metadata).
    pub company_id: CompanyId,

    pub email: String,

    pub name: Option<String>,

    /// Idempotency key for safe retries.
    pub idempotency_key: Option<String>,
}

/// Customer in the billing system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Provider's customer ref.
    pub id: String,

    pub email: Option<String>,
}

/// The subset of a provider subscription entitlement sync needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDetails {
    pub subscription_ref: String,
    pub customer_ref: String,
    pub plan_ref: Option<String>,
    pub period_end: Timestamp,
}

/// Billing provider error.
#[derive(Debug, Clone)]
pub struct BillingError {
    /// Error code for categorization.
    pub code: BillingErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl BillingError {
    /// Create a new billing error.
    pub fn new(code: BillingErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::AuthenticationError, message)
    }

    /// Create an error for a response we could not interpret.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::InvalidResponse, message)
    }

    /// Map an HTTP status returned by the provider.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            401 | 403 => BillingErrorCode::AuthenticationError,
            404 => BillingErrorCode::NotFound,
            429 => BillingErrorCode::RateLimitExceeded,
            500..=599 => BillingErrorCode::ServerError,
            _ => BillingErrorCode::ProviderError,
        };
        Self::new(code, message)
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for BillingError {}

impl From<BillingError> for DomainError {
    fn from(err: BillingError) -> Self {
        DomainError::new(ErrorCode::BillingProviderError, err.message)
            .with_detail("billing_code", err.code.to_string())
    }
}

/// Billing error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingErrorCode {
    /// Network connectivity issue or timeout.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Provider returned a 5xx.
    ServerError,

    /// Provider rejected the request.
    ProviderError,

    /// Response body could not be interpreted.
    InvalidResponse,
}

impl BillingErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingErrorCode::NetworkError
                | BillingErrorCode::RateLimitExceeded
                | BillingErrorCode::ServerError
        )
    }
}

impl std::fmt::Display for BillingErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BillingErrorCode::NetworkError => "network_error",
            BillingErrorCode::AuthenticationError => "authentication_error",
            BillingErrorCode::NotFound => "not_found",
            BillingErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            BillingErrorCode::ServerError => "server_error",
            BillingErrorCode::ProviderError => "provider_error",
            BillingErrorCode::InvalidResponse => "invalid_response",
        };
        write!(f, "{}", s)
    }
}

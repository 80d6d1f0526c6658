//! Webhook error types for billing webhook handling.
//!
//! Defines all error conditions that can occur during webhook processing,
//! with HTTP status code mapping and retryability semantics.

use http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No signature header on the request.
    #[error("Missing signature")]
    SignatureMissing,

    /// Signature header malformed or no signature matched.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// Signature timestamp is outside the tolerance window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Verified payload is not a well-formed event.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Required field missing from webhook payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// No entitlement record carries the event's customer reference.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Subscription lookup against the billing provider failed.
    #[error("Billing provider lookup failed: {0}")]
    BillingProviderLookupFailed(String),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_)
                | WebhookError::BillingProviderLookupFailed(_)
                | WebhookError::CustomerNotFound(_) // Provisioning may not have committed yet
        )
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// Status codes determine the provider's retry behavior:
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx: Client error, no retry
    /// - 5xx: Server error, will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::SignatureInvalid | WebhookError::TimestampOutOfRange => {
                StatusCode::UNAUTHORIZED
            }

            WebhookError::SignatureMissing
            | WebhookError::MalformedPayload(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,

            WebhookError::Ignored(_) => StatusCode::OK,

            WebhookError::BillingProviderLookupFailed(_) => StatusCode::SERVICE_UNAVAILABLE,

            WebhookError::CustomerNotFound(_) | WebhookError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable code used in error response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::SignatureMissing => "SIGNATURE_MISSING",
            WebhookError::SignatureInvalid => "SIGNATURE_INVALID",
            WebhookError::TimestampOutOfRange => "TIMESTAMP_OUT_OF_RANGE",
            WebhookError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            WebhookError::MissingField(_) => "MISSING_FIELD",
            WebhookError::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            WebhookError::BillingProviderLookupFailed(_) => "BILLING_PROVIDER_LOOKUP_FAILED",
            WebhookError::Ignored(_) => "IGNORED",
            WebhookError::Database(_) => "DATABASE_ERROR",
        }
    }
}

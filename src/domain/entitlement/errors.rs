//! Entitlement-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | CompanyNotFound | 404 |
//! | AlreadyProvisioned | 409 |
//! | BillingProvider | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{CompanyId, DomainError, ErrorCode};

/// Errors raised by provisioning and entitlement queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    /// No entitlement record exists for this company.
    CompanyNotFound(CompanyId),

    /// The company already has an entitlement record.
    AlreadyProvisioned(CompanyId),

    /// The billing provider rejected or failed the request.
    BillingProvider(String),

    /// Infrastructure error.
    Infrastructure(String),
}

impl EntitlementError {
    pub fn company_not_found(company_id: CompanyId) -> Self {
        EntitlementError::CompanyNotFound(company_id)
    }

    pub fn already_provisioned(company_id: CompanyId) -> Self {
        EntitlementError::AlreadyProvisioned(company_id)
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        EntitlementError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EntitlementError::CompanyNotFound(_) => ErrorCode::CompanyNotFound,
            EntitlementError::AlreadyProvisioned(_) => ErrorCode::AlreadyExists,
            EntitlementError::BillingProvider(_) => ErrorCode::BillingProviderError,
            EntitlementError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            EntitlementError::CompanyNotFound(id) => {
                format!("No entitlement record for company: {}", id)
            }
            EntitlementError::AlreadyProvisioned(id) => {
                format!("Company {} is already provisioned", id)
            }
            EntitlementError::BillingProvider(msg) => format!("Billing provider error: {}", msg),
            EntitlementError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for EntitlementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for EntitlementError {}

impl From<DomainError> for EntitlementError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::BillingProviderError => EntitlementError::BillingProvider(err.message),
            _ => EntitlementError::Infrastructure(err.to_string()),
        }
    }
}

impl From<EntitlementError> for DomainError {
    fn from(err: EntitlementError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

//! Entitlement check port for content-serving paths.
//!
//! Every path that renders company content (activity detail, activity
//! listing, company profile) asks this port whether the company may be shown.
//!
//! # Design
//!
//! The checker follows a **fail-closed** design: `is_visible` treats ANY
//! error as "not entitled". Content is never shown on a guessed default.
//!
//! # Example
//!
//! ```ignore
//! use entitlement_sync::ports::EntitlementChecker;
//!
//! async fn show_profile(checker: &dyn EntitlementChecker, company_id: &CompanyId) -> Option<Profile> {
//!     if !checker.is_visible(company_id, Timestamp::now()).await {
//!         return None;
//!     }
//!     // ... load and render the profile
//! }
//! ```

use async_trait::async_trait;

use crate::domain::foundation::{CompanyId, DomainError, Timestamp};

/// Port for the single entitlement decision.
#[async_trait]
pub trait EntitlementChecker: Send + Sync {
    /// Decide whether the company is entitled at `now`.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error. Callers should prefer `is_visible`.
    async fn is_entitled(&self, company_id: &CompanyId, now: Timestamp)
        -> Result<bool, DomainError>;

    /// Fail-closed visibility decision for content paths.
    async fn is_visible(&self, company_id: &CompanyId, now: Timestamp) -> bool {
        match self.is_entitled(company_id, now).await {
            Ok(entitled) => entitled,
            Err(e) => {
                tracing::warn!(
                    company_id = %company_id,
                    error = %e,
                    "Entitlement check failed, hiding content"
                );
                false
            }
        }
    }
}

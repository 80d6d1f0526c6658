//! EntitlementRepository port - Persistence of per-company entitlement records.

use async_trait::async_trait;

use crate::domain::entitlement::{ApplyOutcome, EntitlementRecord, TermTransition};
use crate::domain::foundation::{CompanyId, DomainError, Timestamp};

/// Port for entitlement record persistence.
///
/// Records are keyed by company id and uniquely indexed by customer ref.
#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    /// Store a freshly provisioned record.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the company or the customer ref already has a record
    /// - `DatabaseError` on persistence failure
    async fn create(&self, record: &EntitlementRecord) -> Result<(), DomainError>;

    /// Find a record by company id.
    async fn find_by_company_id(
        &self,
        company_id: &CompanyId,
    ) -> Result<Option<EntitlementRecord>, DomainError>;

    /// Find a record by the billing provider's customer ref.
    async fn find_by_customer_ref(
        &self,
        customer_ref: &str,
    ) -> Result<Option<EntitlementRecord>, DomainError>;

    /// Atomically load the record for `customer_ref`, apply the transition and
    /// persist the result.
    ///
    /// Concurrent calls for the same record are serialized.
    ///
    /// # Errors
    ///
    /// - `CustomerNotFound` if no record carries `customer_ref`
    /// - `DatabaseError` on persistence failure
    async fn apply_transition(
        &self,
        customer_ref: &str,
        transition: &TermTransition,
        event_at: Timestamp,
    ) -> Result<ApplyOutcome, DomainError>;

    /// Delete the record of a removed company. Returns whether a record existed.
    async fn delete(&self, company_id: &CompanyId) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entitlement_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn EntitlementRepository) {}
    }
}

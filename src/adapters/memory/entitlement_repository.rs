//! In-memory entitlement repository.
//!
//! Stores records in a `HashMap` behind a tokio `RwLock`. The write lock
//! serializes `apply_transition` the way a row lock does in PostgreSQL.
//! Useful for testing and local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entitlement::{ApplyOutcome, EntitlementRecord, TermTransition};
use crate::domain::foundation::{CompanyId, DomainError, ErrorCode, Timestamp};
use crate::ports::EntitlementRepository;

/// In-memory storage for entitlement records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntitlementRepository {
    records: Arc<RwLock<HashMap<CompanyId, EntitlementRecord>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryEntitlementRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with `DatabaseError` (for failure-path tests).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of every stored record.
    pub async fn snapshot(&self) -> Vec<EntitlementRecord> {
        self.records.read().await.values().cloned().collect()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::database("Entitlement store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl EntitlementRepository for InMemoryEntitlementRepository {
    async fn create(&self, record: &EntitlementRecord) -> Result<(), DomainError> {
        self.check_available()?;
        let mut records = self.records.write().await;

        let duplicate = records.contains_key(&record.company_id)
            || records
                .values()
                .any(|existing| existing.customer_ref == record.customer_ref);
        if duplicate {
            return Err(DomainError::new(
                ErrorCode::AlreadyExists,
                "Entitlement record already exists",
            )
            .with_detail("company_id", record.company_id.to_string()));
        }

        records.insert(record.company_id, record.clone());
        Ok(())
    }

    async fn find_by_company_id(
        &self,
        company_id: &CompanyId,
    ) -> Result<Option<EntitlementRecord>, DomainError> {
        self.check_available()?;
        Ok(self.records.read().await.get(company_id).cloned())
    }

    async fn find_by_customer_ref(
        &self,
        customer_ref: &str,
    ) -> Result<Option<EntitlementRecord>, DomainError> {
        self.check_available()?;
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.customer_ref == customer_ref)
            .cloned())
    }

    async fn apply_transition(
        &self,
        customer_ref: &str,
        transition: &TermTransition,
        event_at: Timestamp,
    ) -> Result<ApplyOutcome, DomainError> {
        self.check_available()?;
        let mut records = self.records.write().await;

        let record = records
            .values_mut()
            .find(|r| r.customer_ref == customer_ref)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::CustomerNotFound, "No entitlement record for customer")
                    .with_detail("customer_ref", customer_ref)
            })?;

        Ok(record.apply(transition, event_at))
    }

    async fn delete(&self, company_id: &CompanyId) -> Result<bool, DomainError> {
        self.check_available()?;
        Ok(self.records.write().await.remove(company_id).is_some())
    }
}

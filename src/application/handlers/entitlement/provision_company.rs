//! ProvisionCompanyHandler and RemoveCompanyHandler - Entitlement record lifecycle.

use std::sync::Arc;

use crate::domain::entitlement::{EntitlementError, EntitlementRecord};
use crate::domain::foundation::{CompanyId, ErrorCode};
use crate::ports::{BillingProvider, CreateCustomerRequest, EntitlementRepository};

/// Command to provision billing for a new company.
#[derive(Debug, Clone)]
pub struct ProvisionCompanyCommand {
    pub company_id: CompanyId,
    pub email: String,
    pub name: Option<String>,
}

/// Handler that creates the provider customer and the empty entitlement record.
pub struct ProvisionCompanyHandler {
    repository: Arc<dyn EntitlementRepository>,
    billing_provider: Arc<dyn BillingProvider>,
}

impl ProvisionCompanyHandler {
    pub fn new(
        repository: Arc<dyn EntitlementRepository>,
        billing_provider: Arc<dyn BillingProvider>,
    ) -> Self {
        Self {
            repository,
            billing_provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProvisionCompanyCommand,
    ) -> Result<EntitlementRecord, EntitlementError> {
        // 1. One record per company
        if self
            .repository
            .find_by_company_id(&cmd.company_id)
            .await?
            .is_some()
        {
            return Err(EntitlementError::already_provisioned(cmd.company_id));
        }

        // 2. Create the customer; the key makes a retried provisioning reuse it
        let customer = self
            .billing_provider
            .create_customer(CreateCustomerRequest {
                company_id: cmd.company_id,
                email: cmd.email,
                name: cmd.name,
                idempotency_key: Some(format!("company-{}", cmd.company_id)),
            })
            .await
            .map_err(|e| EntitlementError::BillingProvider(e.message))?;

        // 3. Persist the empty record
        let record = EntitlementRecord::provision(cmd.company_id, customer.id);
        self.repository.create(&record).await.map_err(|e| match e.code {
            ErrorCode::AlreadyExists => EntitlementError::already_provisioned(cmd.company_id),
            _ => EntitlementError::from(e),
        })?;

        tracing::info!(
            company_id = %record.company_id,
            customer_ref = %record.customer_ref,
            "Company provisioned"
        );

        Ok(record)
    }
}

/// Command to remove a deleted company's entitlement record.
#[derive(Debug, Clone)]
pub struct RemoveCompanyCommand {
    pub company_id: CompanyId,
}

/// Handler that deletes the entitlement record along with its company.
pub struct RemoveCompanyHandler {
    repository: Arc<dyn EntitlementRepository>,
}

impl RemoveCompanyHandler {
    pub fn new(repository: Arc<dyn EntitlementRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: RemoveCompanyCommand) -> Result<(), EntitlementError> {
        if !self.repository.delete(&cmd.company_id).await? {
            return Err(EntitlementError::company_not_found(cmd.company_id));
        }
        tracing::info!(company_id = %cmd.company_id, "Company entitlement removed");
        Ok(())
    }
}

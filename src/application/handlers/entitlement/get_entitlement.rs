//! GetEntitlementHandler - Query handler for the account-management view.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::entitlement::{EntitlementError, EntitlementStatus, TrialWindow};
use crate::domain::foundation::{CompanyId, Timestamp};
use crate::ports::EntitlementRepository;

use super::entitled_at;

/// Query for a company's entitlement at `now`.
#[derive(Debug, Clone)]
pub struct GetEntitlementQuery {
    pub company_id: CompanyId,
    pub now: Timestamp,
}

/// Account-management view of an entitlement record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitlementView {
    pub company_id: CompanyId,
    pub customer_ref: String,
    pub subscription_ref: Option<String>,
    pub plan_ref: Option<String>,
    pub period_end: Option<Timestamp>,
    pub status: EntitlementStatus,
    /// Evaluator decision, independent of whether the gate is enforced.
    pub entitled: bool,
}

/// Handler for entitlement queries.
pub struct GetEntitlementHandler {
    repository: Arc<dyn EntitlementRepository>,
    trial: TrialWindow,
}

impl GetEntitlementHandler {
    pub fn new(repository: Arc<dyn EntitlementRepository>, trial: TrialWindow) -> Self {
        Self { repository, trial }
    }

    pub async fn handle(&self, query: GetEntitlementQuery) -> Result<EntitlementView, EntitlementError> {
        let record = self
            .repository
            .find_by_company_id(&query.company_id)
            .await?
            .ok_or(EntitlementError::CompanyNotFound(query.company_id))?;

        let on_trial = self.trial.is_on_trial(query.now);
        let term = record.subscription.as_ref();

        Ok(EntitlementView {
            company_id: record.company_id,
            customer_ref: record.customer_ref.clone(),
            subscription_ref: term.map(|t| t.subscription_ref.clone()),
            plan_ref: term.and_then(|t| t.plan_ref.clone()),
            period_end: term.map(|t| t.period_end),
            status: record.status(query.now, on_trial),
            entitled: entitled_at(Some(&record), &self.trial, query.now),
        })
    }
}

//! EntitlementGate - The single entitlement evaluator behind every content path.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::entitlement::{EntitlementRecord, TrialWindow};
use crate::domain::foundation::{CompanyId, DomainError, Timestamp};
use crate::ports::{EntitlementChecker, EntitlementRepository};

/// Pure entitlement rule.
///
/// Inside the trial window every company is entitled. Outside it a company
/// is entitled iff its record holds a subscription paid through a later
/// instant than `now`. No record means not entitled.
pub fn entitled_at(record: Option<&EntitlementRecord>, trial: &TrialWindow, now: Timestamp) -> bool {
    if trial.is_on_trial(now) {
        return true;
    }
    record.is_some_and(|r| r.is_paid_through(now))
}

/// Evaluator combining the trial window with stored entitlement records.
///
/// While `enforce` is off every company is visible and the store is not read.
pub struct EntitlementGate {
    repository: Arc<dyn EntitlementRepository>,
    trial: TrialWindow,
    enforce: bool,
}

impl EntitlementGate {
    pub fn new(repository: Arc<dyn EntitlementRepository>, trial: TrialWindow, enforce: bool) -> Self {
        Self {
            repository,
            trial,
            enforce,
        }
    }

    pub fn is_enforcing(&self) -> bool {
        self.enforce
    }

    /// Apply the entitlement rule regardless of the enforce flag.
    pub async fn evaluate(&self, company_id: &CompanyId, now: Timestamp) -> Result<bool, DomainError> {
        if self.trial.is_on_trial(now) {
            return Ok(true);
        }
        let record = self.repository.find_by_company_id(company_id).await?;
        Ok(entitled_at(record.as_ref(), &self.trial, now))
    }
}

#[async_trait]
impl EntitlementChecker for EntitlementGate {
    async fn is_entitled(&self, company_id: &CompanyId, now: Timestamp) -> Result<bool, DomainError> {
        if !self.enforce {
            return Ok(true);
        }
        self.evaluate(company_id, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryEntitlementRepository;
    use crate::domain::entitlement::{SubscriptionTerm, TermTransition};
    use proptest::prelude::*;

    // 2024-01-01 .. 2024-02-01
    const TRIAL_START: i64 = 1_704_067_200;
    const TRIAL_END: i64 = 1_706_745_600;
    const DAY: i64 = 86_400;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn trial() -> TrialWindow {
        TrialWindow::new(ts(TRIAL_START), ts(TRIAL_END)).unwrap()
    }

    async fn gate_with(
        record: Option<EntitlementRecord>,
        enforce: bool,
    ) -> (EntitlementGate, Arc<InMemoryEntitlementRepository>) {
        let repo = Arc::new(InMemoryEntitlementRepository::new());
        if let Some(record) = record {
            repo.create(&record).await.unwrap();
        }
        (EntitlementGate::new(repo.clone(), trial(), enforce), repo)
    }

    fn subscribed(company_id: CompanyId, period_end: i64) -> EntitlementRecord {
        let mut record = EntitlementRecord::provision(company_id, "cus_1");
        record.apply(
            &TermTransition::Started(SubscriptionTerm::new(
                "sub_1",
                Some("price_monthly".to_string()),
                ts(period_end),
            )),
            ts(TRIAL_END),
        );
        record
    }

    // ══════════════════════════════════════════════════════════════
    // Rule Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn trial_takes_precedence_over_missing_subscription() {
        let id = CompanyId::new();
        let (gate, _) = gate_with(Some(EntitlementRecord::provision(id, "cus_1")), true).await;

        assert!(gate.is_entitled(&id, ts(TRIAL_START + DAY)).await.unwrap());
    }

    #[tokio::test]
    async fn lapsed_subscription_outside_trial_is_not_entitled() {
        let id = CompanyId::new();
        let now = TRIAL_END + 10 * DAY;
        let (gate, _) = gate_with(Some(subscribed(id, now - DAY)), true).await;

        assert!(!gate.is_entitled(&id, ts(now)).await.unwrap());
    }

    #[tokio::test]
    async fn active_subscription_outside_trial_is_entitled() {
        let id = CompanyId::new();
        let now = TRIAL_END + 10 * DAY;
        let (gate, _) = gate_with(Some(subscribed(id, now + DAY)), true).await;

        assert!(gate.is_entitled(&id, ts(now)).await.unwrap());
    }

    #[tokio::test]
    async fn no_record_is_not_entitled() {
        let (gate, _) = gate_with(None, true).await;

        assert!(!gate
            .is_entitled(&CompanyId::new(), ts(TRIAL_END + DAY))
            .await
            .unwrap());
    }

    // ══════════════════════════════════════════════════════════════
    // Enforcement Flag Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn disabled_gate_shows_everything_without_reading_store() {
        let (gate, repo) = gate_with(None, false).await;
        repo.set_unavailable(true);

        assert!(!gate.is_enforcing());
        assert!(gate
            .is_entitled(&CompanyId::new(), ts(TRIAL_END + DAY))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn evaluate_ignores_disabled_flag() {
        let (gate, _) = gate_with(None, false).await;

        assert!(!gate
            .evaluate(&CompanyId::new(), ts(TRIAL_END + DAY))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn store_error_makes_content_invisible() {
        let id = CompanyId::new();
        let (gate, repo) = gate_with(Some(subscribed(id, TRIAL_END + 100 * DAY)), true).await;
        repo.set_unavailable(true);

        assert!(gate.is_entitled(&id, ts(TRIAL_END + DAY)).await.is_err());
        assert!(!gate.is_visible(&id, ts(TRIAL_END + DAY)).await);
    }

    // ══════════════════════════════════════════════════════════════
    // Properties
    // ══════════════════════════════════════════════════════════════

    proptest! {
        #[test]
        fn trial_always_wins(offset in 0i64..(TRIAL_END - TRIAL_START), period_end in proptest::option::of(0i64..2_000_000_000)) {
            let record = period_end.map(|end| subscribed(CompanyId::new(), end));
            prop_assert!(entitled_at(record.as_ref(), &trial(), ts(TRIAL_START + offset)));
        }

        #[test]
        fn outside_trial_requires_future_period_end(
            now in TRIAL_END..2_000_000_000i64,
            period_end in 0i64..2_100_000_000,
        ) {
            let record = subscribed(CompanyId::new(), period_end);
            prop_assert_eq!(entitled_at(Some(&record), &trial(), ts(now)), period_end > now);
        }

        #[test]
        fn cleared_record_is_never_entitled_outside_trial(now in TRIAL_END..2_000_000_000i64) {
            let mut record = subscribed(CompanyId::new(), now + DAY);
            record.apply(
                &TermTransition::Cleared {
                    subscription_ref: "sub_1".to_string(),
                },
                ts(now),
            );
            prop_assert!(!entitled_at(Some(&record), &trial(), ts(now)));
        }
    }
}

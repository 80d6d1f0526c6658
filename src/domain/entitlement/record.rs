//! Entitlement record aggregate.
//!
//! One record per company. Holds the billing provider's customer reference
//! and, while the company has a paid subscription, the current term.
//!
//! # Design Decisions
//!
//! - **Term as a unit**: subscription ref, plan ref and period end live in one
//!   `Option<SubscriptionTerm>` so they can only be written together
//! - **Immutable customer ref**: set at provisioning, never reassigned
//! - **Latest truth wins**: transitions older than the last applied event are skipped

use crate::domain::foundation::{CompanyId, Timestamp};
use serde::{Deserialize, Serialize};

use super::EntitlementStatus;

/// The paid term a company currently holds with the billing provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionTerm {
    /// Provider subscription reference (e.g. `sub_...`).
    pub subscription_ref: String,

    /// Provider price/plan reference (e.g. `price_...`).
    pub plan_ref: Option<String>,

    /// Instant through which the current term is paid.
    pub period_end: Timestamp,
}

impl SubscriptionTerm {
    pub fn new(
        subscription_ref: impl Into<String>,
        plan_ref: Option<String>,
        period_end: Timestamp,
    ) -> Self {
        Self {
            subscription_ref: subscription_ref.into(),
            plan_ref,
            period_end,
        }
    }

    /// True while the paid-through instant lies strictly after `now`.
    pub fn is_paid_through(&self, now: Timestamp) -> bool {
        self.period_end.is_after(&now)
    }
}

/// A state change requested by a verified billing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermTransition {
    /// Checkout completed: overwrite the whole term.
    Started(SubscriptionTerm),

    /// Subscription updated: overwrite plan and period end of the named subscription.
    Renewed {
        subscription_ref: String,
        plan_ref: Option<String>,
        period_end: Timestamp,
    },

    /// Subscription deleted: clear the term if it belongs to the named subscription.
    Cleared { subscription_ref: String },
}

impl TermTransition {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            TermTransition::Started(_) => "started",
            TermTransition::Renewed { .. } => "renewed",
            TermTransition::Cleared { .. } => "cleared",
        }
    }
}

/// Result of applying a transition to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The record was overwritten.
    Applied,

    /// The event predates the last applied event; the record is unchanged.
    SkippedStale,

    /// A renewal arrived for a record without a subscription; the record is unchanged.
    SkippedNoSubscription,

    /// The event names a subscription other than the one on record, e.g. one
    /// superseded by a plan switch; the record is unchanged.
    SkippedOtherSubscription,
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied)
    }
}

/// Entitlement record - a company's billing state as last reported.
///
/// # Invariants
///
/// - `company_id` and `customer_ref` never change after creation
/// - `customer_ref` is unique across records
/// - `subscription == None` means no paid entitlement and no period end
/// - `last_event_at` never moves backwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    pub company_id: CompanyId,
    pub customer_ref: String,

    /// Current paid term, if any. A term whose period end has passed is lapsed.
    pub subscription: Option<SubscriptionTerm>,

    /// `created` of the most recent billing event applied to this record.
    pub last_event_at: Option<Timestamp>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EntitlementRecord {
    /// Create a freshly provisioned record with no subscription.
    pub fn provision(company_id: CompanyId, customer_ref: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            company_id,
            customer_ref: customer_ref.into(),
            subscription: None,
            last_event_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a transition carried by an event created at `event_at`.
    ///
    /// Events older than `last_event_at` are skipped. Equal timestamps are
    /// applied so a redelivered event reaches the same end state. Renewals and
    /// deletions only touch the term of the subscription they name.
    pub fn apply(&mut self, transition: &TermTransition, event_at: Timestamp) -> ApplyOutcome {
        if let Some(last) = self.last_event_at {
            if event_at.is_before(&last) {
                return ApplyOutcome::SkippedStale;
            }
        }

        match transition {
            TermTransition::Started(term) => {
                self.subscription = Some(term.clone());
            }
            TermTransition::Renewed {
                subscription_ref,
                plan_ref,
                period_end,
            } => match self.subscription.as_mut() {
                Some(term) if term.subscription_ref != *subscription_ref => {
                    return ApplyOutcome::SkippedOtherSubscription
                }
                Some(term) => {
                    term.plan_ref = plan_ref.clone();
                    term.period_end = *period_end;
                }
                None => return ApplyOutcome::SkippedNoSubscription,
            },
            TermTransition::Cleared { subscription_ref } => {
                let other = self
                    .subscription
                    .as_ref()
                    .is_some_and(|term| term.subscription_ref != *subscription_ref);
                if other {
                    return ApplyOutcome::SkippedOtherSubscription;
                }
                self.subscription = None;
            }
        }

        self.last_event_at = Some(event_at);
        self.updated_at = Timestamp::now();
        ApplyOutcome::Applied
    }

    /// True iff a subscription exists and its period end lies after `now`.
    ///
    /// Ignores the trial window.
    pub fn is_paid_through(&self, now: Timestamp) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|term| term.is_paid_through(now))
    }

    /// Derive the account-management status at `now`.
    pub fn status(&self, now: Timestamp, on_trial: bool) -> EntitlementStatus {
        if on_trial {
            return EntitlementStatus::Trial;
        }
        match &self.subscription {
            Some(term) if term.is_paid_through(now) => EntitlementStatus::Active,
            Some(_) => EntitlementStatus::Lapsed,
            None => EntitlementStatus::NoSubscription,
        }
    }
}

//! Derived entitlement status shown to account management.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a company's entitlement at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementStatus {
    /// Inside the trial window. Entitled regardless of billing state.
    Trial,

    /// Subscription present and paid through a future instant.
    Active,

    /// Subscription present but its period end has passed.
    Lapsed,

    /// No subscription on record.
    #[serde(rename = "none")]
    NoSubscription,
}

impl EntitlementStatus {
    /// Returns true if this status grants public visibility.
    pub fn is_entitled(&self) -> bool {
        matches!(self, EntitlementStatus::Trial | EntitlementStatus::Active)
    }
}

impl fmt::Display for EntitlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntitlementStatus::Trial => "trial",
            EntitlementStatus::Active => "active",
            EntitlementStatus::Lapsed => "lapsed",
            EntitlementStatus::NoSubscription => "none",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_trial_and_active_are_entitled() {
        assert!(EntitlementStatus::Trial.is_entitled());
        assert!(EntitlementStatus::Active.is_entitled());
        assert!(!EntitlementStatus::Lapsed.is_entitled());
        assert!(!EntitlementStatus::NoSubscription.is_entitled());
    }

    #[test]
    fn serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_string(&EntitlementStatus::NoSubscription).unwrap(),
            "\"none\""
        );
        assert_eq!(
            serde_json::to_string(&EntitlementStatus::Lapsed).unwrap(),
            "\"lapsed\""
        );
    }
}

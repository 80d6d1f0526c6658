//! Feature flags configuration

use serde::Deserialize;

/// Feature flags for enabling/disabling functionality
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FeatureFlags {
    /// Hide content of companies that are not entitled.
    ///
    /// Off by default: every company stays visible until the gate is switched on.
    #[serde(default)]
    pub enforce_entitlement_gate: bool,

    /// Use in-memory stores instead of PostgreSQL (local development only)
    #[serde(default)]
    pub in_memory_store: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_flags_defaults() {
        let flags = FeatureFlags::default();
        assert!(!flags.enforce_entitlement_gate);
        assert!(!flags.in_memory_store);
    }

    #[test]
    fn test_feature_flags_deserialization() {
        let flags: FeatureFlags =
            serde_json::from_str(r#"{"enforce_entitlement_gate": true}"#).unwrap();
        assert!(flags.enforce_entitlement_gate);
        assert!(!flags.in_memory_store);
    }
}

//! Billing provider configuration (Stripe)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::application::handlers::entitlement::MAX_RETENTION_DAYS;

use super::error::ValidationError;

/// Upper bound on `prune_interval_secs` (one week).
pub const MAX_PRUNE_INTERVAL_SECS: u64 = 7 * 86_400;

/// Billing provider configuration.
///
/// The webhook signing secret is required at start and never changes while
/// the process runs.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Stripe secret API key (sk_...)
    pub api_key: SecretString,

    /// Webhook signing secret (whsec_...)
    pub webhook_secret: SecretString,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Outbound request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Delay before the single retry of a failed outbound call
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Oldest accepted signature timestamp, in seconds
    #[serde(default = "default_signature_tolerance")]
    pub signature_tolerance_secs: i64,

    /// Accepted clock skew for signature timestamps in the future, in seconds
    #[serde(default = "default_clock_skew")]
    pub clock_skew_secs: i64,

    /// Days to keep processed webhook events
    #[serde(default = "default_retention_days")]
    pub webhook_retention_days: i64,

    /// How often the processed-event log is pruned, in seconds
    #[serde(default = "default_prune_interval")]
    pub prune_interval_secs: u64,
}

impl BillingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.prune_interval_secs)
    }

    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.api_key.expose_secret().starts_with("sk_test_")
    }

    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let api_key = self.api_key.expose_secret();
        let webhook_secret = self.webhook_secret.expose_secret();

        if api_key.is_empty() {
            return Err(ValidationError::MissingRequired("BILLING__API_KEY"));
        }
        if webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("BILLING__WEBHOOK_SECRET"));
        }
        if !api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBillingUrl);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 60 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.signature_tolerance_secs <= 0 || self.clock_skew_secs < 0 {
            return Err(ValidationError::InvalidSignatureTolerance);
        }
        if !(1..=MAX_RETENTION_DAYS).contains(&self.webhook_retention_days) {
            return Err(ValidationError::InvalidRetention);
        }
        if !(1..=MAX_PRUNE_INTERVAL_SECS).contains(&self.prune_interval_secs) {
            return Err(ValidationError::InvalidPruneInterval);
        }
        Ok(())
    }
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_retry_backoff() -> u64 {
    250
}

fn default_signature_tolerance() -> i64 {
    300
}

fn default_clock_skew() -> i64 {
    60
}

fn default_retention_days() -> i64 {
    30
}

fn default_prune_interval() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str, webhook_secret: &str) -> BillingConfig {
        serde_json::from_value(serde_json::json!({
            "api_key": api_key,
            "webhook_secret": webhook_secret,
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = config("sk_test_abc", "whsec_abc");
        assert_eq!(config.api_base_url, "https://api.stripe.com");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.retry_backoff(), Duration::from_millis(250));
        assert_eq!(config.signature_tolerance_secs, 300);
        assert_eq!(config.clock_skew_secs, 60);
        assert_eq!(config.webhook_retention_days, 30);
        assert!(config.is_test_mode());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_webhook_secret() {
        assert!(matches!(
            config("sk_test_abc", "").validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_validation_invalid_api_key_prefix() {
        assert!(matches!(
            config("pk_test_abc", "whsec_abc").validate(),
            Err(ValidationError::InvalidStripeKey)
        ));
    }

    #[test]
    fn test_validation_invalid_webhook_secret_prefix() {
        assert!(matches!(
            config("sk_test_abc", "secret_abc").validate(),
            Err(ValidationError::InvalidStripeWebhookSecret)
        ));
    }

    #[test]
    fn test_validation_invalid_retention() {
        let mut config = config("sk_test_abc", "whsec_abc");
        config.webhook_retention_days = 0;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidRetention)));
    }

    #[test]
    fn test_validation_retention_upper_bound() {
        let mut config = config("sk_test_abc", "whsec_abc");
        config.webhook_retention_days = i64::MAX;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidRetention)));

        config.webhook_retention_days = MAX_RETENTION_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_prune_interval() {
        let mut config = config("sk_test_abc", "whsec_abc");
        config.prune_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidPruneInterval)));
    }

    #[test]
    fn test_validation_prune_interval_upper_bound() {
        let mut config = config("sk_test_abc", "whsec_abc");
        config.prune_interval_secs = MAX_PRUNE_INTERVAL_SECS + 1;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidPruneInterval)));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let debug = format!("{:?}", config("sk_test_abc", "whsec_abc"));
        assert!(!debug.contains("sk_test_abc"));
        assert!(!debug.contains("whsec_abc"));
    }
}

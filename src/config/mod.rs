//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `ENTITLEMENT_SYNC`
//! prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use entitlement_sync::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod billing;
mod database;
mod error;
mod features;
mod server;
mod trial;

pub use billing::BillingConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use features::FeatureFlags;
pub use server::{Environment, ServerConfig};
pub use trial::TrialConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Billing provider configuration (Stripe)
    pub billing: BillingConfig,

    /// Trial window boundaries
    pub trial: TrialConfig,

    /// Feature flags
    #[serde(default)]
    pub features: FeatureFlags,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ENTITLEMENT_SYNC` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `ENTITLEMENT_SYNC__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ENTITLEMENT_SYNC__BILLING__WEBHOOK_SECRET=whsec_...` -> `billing.webhook_secret`
    /// - `ENTITLEMENT_SYNC__TRIAL__START=2024-01-01T00:00:00Z` -> `trial.start`
    /// - `ENTITLEMENT_SYNC__SERVER__ADMIN_TOKEN=...` -> `server.admin_token`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ENTITLEMENT_SYNC")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if !self.features.in_memory_store {
            self.database.validate()?;
        }
        self.billing.validate()?;
        self.trial.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[(&str, &str)] = &[
        ("ENTITLEMENT_SYNC__DATABASE__URL", "postgresql://test@localhost/test"),
        ("ENTITLEMENT_SYNC__BILLING__API_KEY", "sk_test_xxx"),
        ("ENTITLEMENT_SYNC__BILLING__WEBHOOK_SECRET", "whsec_xxx"),
        ("ENTITLEMENT_SYNC__TRIAL__START", "2024-01-01T00:00:00Z"),
        ("ENTITLEMENT_SYNC__TRIAL__END", "2024-04-01T00:00:00Z"),
    ];

    const OPTIONAL: &[&str] = &[
        "ENTITLEMENT_SYNC__SERVER__PORT",
        "ENTITLEMENT_SYNC__SERVER__ENVIRONMENT",
        "ENTITLEMENT_SYNC__FEATURES__ENFORCE_ENTITLEMENT_GATE",
    ];

    fn set_minimal_env() {
        for (key, value) in VARS {
            env::set_var(key, value);
        }
    }

    fn clear_env() {
        for (key, _) in VARS {
            env::remove_var(key);
        }
        for key in OPTIONAL {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.billing.webhook_secret.expose_secret(), "whsec_xxx");
        assert_eq!(config.trial.window().unwrap().start().as_unix_secs(), 1_704_067_200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gate_defaults_to_off() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(!result.unwrap().features.enforce_entitlement_gate);
    }

    #[test]
    fn test_gate_and_server_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("ENTITLEMENT_SYNC__FEATURES__ENFORCE_ENTITLEMENT_GATE", "true");
        env::set_var("ENTITLEMENT_SYNC__SERVER__PORT", "3000");
        env::set_var("ENTITLEMENT_SYNC__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.features.enforce_entitlement_gate);
        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
    }

    #[test]
    fn test_missing_trial_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::remove_var("ENTITLEMENT_SYNC__TRIAL__END");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }
}

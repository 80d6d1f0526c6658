//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid Stripe API key format")]
    InvalidStripeKey,

    #[error("Invalid Stripe webhook secret format")]
    InvalidStripeWebhookSecret,

    #[error("Invalid billing API base URL")]
    InvalidBillingUrl,

    #[error("Invalid webhook signature tolerance")]
    InvalidSignatureTolerance,

    #[error("Webhook retention must be between 1 and 3650 days")]
    InvalidRetention,

    #[error("Webhook prune interval must be between 1 second and 7 days")]
    InvalidPruneInterval,

    #[error("Admin token must be at least 32 characters")]
    WeakAdminToken,

    #[error("Trial window end is before its start")]
    InvalidTrialWindow,
}

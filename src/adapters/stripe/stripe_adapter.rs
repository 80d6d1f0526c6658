//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` port against the Stripe REST API.
//!
//! # Behaviour
//!
//! - Every request is bounded by the configured timeout
//! - Retryable failures (network, 429, 5xx) are retried once after a backoff
//! - Customer creation sends an `Idempotency-Key` so the retry cannot
//!   create a second customer
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_timeout(Duration::from_secs(10));
//! let adapter = StripeBillingProvider::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::time::sleep;

use crate::ports::{
    BillingError, BillingProvider, CreateCustomerRequest, Customer, SubscriptionDetails,
};

use super::api_types::{StripeCustomer, StripeErrorBody, StripeSubscription};

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Per-request timeout.
    request_timeout: Duration,

    /// Delay before the single retry.
    retry_backoff: Duration,
}

impl StripeConfig {
    /// Create a configuration with default endpoint, 10s timeout and 250ms backoff.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_millis(250),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("retry_backoff", &self.retry_backoff)
            .finish()
    }
}

/// Stripe billing provider.
pub struct StripeBillingProvider {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeBillingProvider {
    /// Create a new adapter; fails only if the HTTP client cannot be built.
    pub fn new(config: StripeConfig) -> Result<Self, BillingError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BillingError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Send a request, retrying once on a retryable failure.
    ///
    /// Returns the response for success and 404 statuses; every other
    /// status becomes a `BillingError`.
    async fn send_with_retry<F>(&self, operation: &str, build: F) -> Result<reqwest::Response, BillingError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let err = match self.send_once(&build).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if !err.retryable || attempt >= 1 {
                tracing::error!(
                    operation,
                    attempt,
                    code = %err.code,
                    error = %err.message,
                    "Stripe request failed"
                );
                return Err(err);
            }

            tracing::warn!(
                operation,
                code = %err.code,
                backoff_ms = self.config.retry_backoff.as_millis() as u64,
                "Stripe request failed, retrying"
            );
            sleep(self.config.retry_backoff).await;
            attempt += 1;
        }
    }

    async fn send_once<F>(&self, build: &F) -> Result<reqwest::Response, BillingError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let response = build()
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| BillingError::network(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status.as_u16(), &body))
    }
}

/// Map a failed Stripe response to a `BillingError`.
fn error_from_response(status: u16, body: &str) -> BillingError {
    match serde_json::from_str::<StripeErrorBody>(body) {
        Ok(parsed) => {
            let message = parsed
                .error
                .message
                .unwrap_or_else(|| format!("Stripe API error (status {})", status));
            let err = BillingError::from_status(status, message);
            match parsed.error.code.or(parsed.error.error_type) {
                Some(code) => err.with_provider_code(code),
                None => err,
            }
        }
        Err(_) => BillingError::from_status(status, format!("Stripe API error (status {}): {}", status, body)),
    }
}

#[async_trait]
impl BillingProvider for StripeBillingProvider {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, BillingError> {
        let url = format!("{}/v1/customers", self.config.api_base_url);

        let mut params = vec![
            ("email", request.email.clone()),
            ("metadata[company_id]", request.company_id.to_string()),
        ];
        if let Some(name) = &request.name {
            params.push(("name", name.clone()));
        }

        let response = self
            .send_with_retry("create_customer", || {
                let builder = self.http_client.post(&url).form(&params);
                match &request.idempotency_key {
                    Some(key) => builder.header("Idempotency-Key", key.as_str()),
                    None => builder,
                }
            })
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BillingError::from_status(404, "Customer endpoint not found"));
        }

        let customer: StripeCustomer = response.json().await.map_err(|e| {
            BillingError::invalid_response(format!("Failed to parse Stripe response: {}", e))
        })?;

        tracing::info!(
            company_id = %request.company_id,
            customer_ref = %customer.id,
            "Stripe customer created"
        );

        Ok(customer.into())
    }

    async fn get_subscription(
        &self,
        subscription_ref: &str,
    ) -> Result<Option<SubscriptionDetails>, BillingError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.config.api_base_url, subscription_ref
        );

        let response = self
            .send_with_retry("get_subscription", || self.http_client.get(&url))
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let subscription: StripeSubscription = response.json().await.map_err(|e| {
            BillingError::invalid_response(format!("Failed to parse Stripe response: {}", e))
        })?;

        subscription.into_details().map(Some)
    }
}

//! Mock billing provider for testing.
//!
//! Provides a configurable implementation of `BillingProvider` for unit
//! and integration tests. Supports:
//! - Pre-configured subscriptions
//! - Error injection, one-shot or per method
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::ports::{
    BillingError, BillingProvider, CreateCustomerRequest, Customer, SubscriptionDetails,
};

/// Mock billing provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockBillingProvider::new();
/// mock.add_subscription(SubscriptionDetails { subscription_ref: "sub_1".into(), ... });
/// mock.set_method_error("get_subscription", BillingError::network("timeout"));
/// ```
#[derive(Default, Clone)]
pub struct MockBillingProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Known subscriptions by ref.
    subscriptions: HashMap<String, SubscriptionDetails>,

    /// Customers created so far, by idempotency key when one was given.
    customers_by_key: HashMap<String, Customer>,

    /// Counter used to mint customer refs.
    customer_seq: u32,

    /// Error to return on next call.
    next_error: Option<BillingError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, BillingError>,

    /// Method names in call order.
    call_log: Vec<String>,
}

impl MockBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Add a subscription to the "provider".
    pub fn add_subscription(&self, subscription: SubscriptionDetails) {
        self.state()
            .subscriptions
            .insert(subscription.subscription_ref.clone(), subscription);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: BillingError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method until cleared.
    pub fn set_method_error(&self, method: &str, error: BillingError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.state().call_log.iter().filter(|m| *m == method).count()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, method: &str) -> Result<(), BillingError> {
        let mut state = self.state();
        state.call_log.push(method.to_string());

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        Ok(())
    }
}

#[async_trait]
impl BillingProvider for MockBillingProvider {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, BillingError> {
        self.enter("create_customer")?;
        let mut state = self.state();

        if let Some(existing) = request
            .idempotency_key
            .as_ref()
            .and_then(|key| state.customers_by_key.get(key))
        {
            return Ok(existing.clone());
        }

        state.customer_seq += 1;
        let customer = Customer {
            id: format!("cus_mock_{}", state.customer_seq),
            email: Some(request.email),
        };
        if let Some(key) = request.idempotency_key {
            state.customers_by_key.insert(key, customer.clone());
        }
        Ok(customer)
    }

    async fn get_subscription(
        &self,
        subscription_ref: &str,
    ) -> Result<Option<SubscriptionDetails>, BillingError> {
        self.enter("get_subscription")?;
        Ok(self.state().subscriptions.get(subscription_ref).cloned())
    }
}

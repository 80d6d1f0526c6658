//! HTTP adapters - REST API implementations.

pub mod entitlement;

use axum::{routing::get, Router};

pub use entitlement::{entitlement_router, EntitlementAppState, VisibleCompany};

/// GET /health - Liveness probe
pub async fn health() -> &'static str {
    "ok"
}

/// Build the full application router with state applied.
pub fn app_router(state: EntitlementAppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(entitlement_router())
        .with_state(state)
}

//! Axum router configuration for entitlement endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{
    get_entitlement, get_visibility, handle_billing_webhook, provision_company, remove_company,
    EntitlementAppState,
};

/// Billing provider webhook routes.
///
/// No user authentication; requests are authenticated by signature.
///
/// # Routes
/// - `POST /billing` - Receive billing events
pub fn webhook_routes() -> Router<EntitlementAppState> {
    Router::new().route("/billing", post(handle_billing_webhook))
}

/// Company routes.
///
/// # Routes
/// - `GET /:company_id/entitlement` - Account-management view
/// - `GET /:company_id/visibility` - 200 if content may be shown, 404 otherwise
/// - `POST /:company_id/provision` - Admin only; create customer and record
/// - `DELETE /:company_id` - Admin only; remove the record
pub fn company_routes() -> Router<EntitlementAppState> {
    Router::new()
        .route("/:company_id", delete(remove_company))
        .route("/:company_id/provision", post(provision_company))
        .route("/:company_id/entitlement", get(get_entitlement))
        .route("/:company_id/visibility", get(get_visibility))
}

/// Complete entitlement router, mounted at `/webhooks` and `/companies`.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .merge(entitlement_router())
///     .with_state(state);
/// ```
pub fn entitlement_router() -> Router<EntitlementAppState> {
    Router::new()
        .nest("/webhooks", webhook_routes())
        .nest("/companies", company_routes())
}

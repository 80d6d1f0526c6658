//! HTTP adapter for entitlement endpoints.
//!
//! - `POST /webhooks/billing` - Billing provider events
//! - `GET /companies/:company_id/entitlement` - Account-management view
//! - `GET /companies/:company_id/visibility` - Content visibility check
//! - `POST /companies/:company_id/provision` - Provision billing (admin token)
//! - `DELETE /companies/:company_id` - Remove entitlement record (admin token)

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{AdminAuth, EntitlementAppState, VisibleCompany, SIGNATURE_HEADER};
pub use routes::entitlement_router;

//! HTTP handlers for entitlement endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRef, FromRequestParts, Json, Path, State};
use axum::http::request::Parts;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::application::handlers::{
    GetEntitlementHandler, GetEntitlementQuery, HandleBillingWebhookCommand,
    HandleBillingWebhookHandler, ProvisionCompanyCommand, ProvisionCompanyHandler,
    RemoveCompanyCommand, RemoveCompanyHandler,
};
use crate::domain::billing::WebhookError;
use crate::domain::entitlement::EntitlementError;
use crate::domain::foundation::{CompanyId, Timestamp};
use crate::ports::EntitlementChecker;

use super::dto::{
    EntitlementResponse, ErrorResponse, ProvisionCompanyRequest, ProvisionCompanyResponse,
    VisibilityResponse, WebhookAckResponse,
};

/// Header carrying the provider's webhook signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state.
///
/// Cloned per request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct EntitlementAppState {
    pub webhook_handler: Arc<HandleBillingWebhookHandler>,
    pub entitlement_query: Arc<GetEntitlementHandler>,
    pub checker: Arc<dyn EntitlementChecker>,
    pub provision_handler: Arc<ProvisionCompanyHandler>,
    pub remove_handler: Arc<RemoveCompanyHandler>,
    /// Bearer token for provisioning routes; `None` rejects every caller.
    pub admin_token: Option<Arc<SecretString>>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Extractor
// ════════════════════════════════════════════════════════════════════════════════

/// Caller presented the configured admin bearer token.
///
/// Expects `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

/// Rejection for `AdminAuth`.
#[derive(Debug)]
pub enum AdminRejection {
    /// No admin token configured for this deployment.
    Disabled,
    Unauthenticated,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        let message = match self {
            AdminRejection::Disabled => "Provisioning is disabled",
            AdminRejection::Unauthenticated => "Missing or invalid admin token",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("UNAUTHORIZED", message)),
        )
            .into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminAuth
where
    EntitlementAppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = EntitlementAppState::from_ref(state);
        let expected = app_state.admin_token.ok_or(AdminRejection::Disabled)?;

        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(AdminRejection::Unauthenticated)?;

        let matches: bool = presented
            .as_bytes()
            .ct_eq(expected.expose_secret().as_bytes())
            .into();
        if !matches {
            tracing::warn!(uri = %parts.uri, "Rejected admin request with wrong token");
            return Err(AdminRejection::Unauthenticated);
        }

        Ok(AdminAuth)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Visibility Extractor
// ════════════════════════════════════════════════════════════════════════════════

/// A company whose content may be shown at request time.
///
/// Reads the `company_id` path parameter. A company that is not visible is
/// rejected with 404, the same response as a company that does not exist.
#[derive(Debug, Clone, Copy)]
pub struct VisibleCompany(pub CompanyId);

/// Rejection for `VisibleCompany`.
#[derive(Debug)]
pub enum VisibilityRejection {
    InvalidCompanyId,
    NotVisible,
}

impl IntoResponse for VisibilityRejection {
    fn into_response(self) -> Response {
        match self {
            VisibilityRejection::InvalidCompanyId => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("VALIDATION_FAILED", "Invalid company id")),
            )
                .into_response(),
            VisibilityRejection::NotVisible => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("NOT_FOUND", "Company not found")),
            )
                .into_response(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for VisibleCompany
where
    EntitlementAppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = VisibilityRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| VisibilityRejection::InvalidCompanyId)?;

        let company_id: CompanyId = params
            .get("company_id")
            .and_then(|raw| raw.parse().ok())
            .ok_or(VisibilityRejection::InvalidCompanyId)?;

        let app_state = EntitlementAppState::from_ref(state);
        if !app_state.checker.is_visible(&company_id, Timestamp::now()).await {
            tracing::debug!(company_id = %company_id, "Company content hidden");
            return Err(VisibilityRejection::NotVisible);
        }

        Ok(VisibleCompany(company_id))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/billing - Receive a billing provider event
pub async fn handle_billing_webhook(
    State(state): State<EntitlementAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleBillingWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    let result = state.webhook_handler.handle(cmd).await?;

    Ok((StatusCode::OK, Json(WebhookAckResponse::from(result))))
}

/// GET /companies/:company_id/entitlement - Account-management entitlement view
pub async fn get_entitlement(
    State(state): State<EntitlementAppState>,
    Path(company_id): Path<String>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let company_id: CompanyId = company_id
        .parse()
        .map_err(|_| EntitlementApiError::InvalidCompanyId)?;

    let view = state
        .entitlement_query
        .handle(GetEntitlementQuery {
            company_id,
            now: Timestamp::now(),
        })
        .await?;

    Ok(Json(EntitlementResponse::from(view)))
}

/// POST /companies/:company_id/provision - Create the provider customer and empty record
pub async fn provision_company(
    State(state): State<EntitlementAppState>,
    _admin: AdminAuth,
    Path(company_id): Path<String>,
    Json(request): Json<ProvisionCompanyRequest>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let company_id: CompanyId = company_id
        .parse()
        .map_err(|_| EntitlementApiError::InvalidCompanyId)?;
    if request.email.trim().is_empty() {
        return Err(EntitlementApiError::InvalidRequest("email is required"));
    }

    let record = state
        .provision_handler
        .handle(ProvisionCompanyCommand {
            company_id,
            email: request.email,
            name: request.name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProvisionCompanyResponse::from(record)),
    ))
}

/// DELETE /companies/:company_id - Remove a deleted company's record
pub async fn remove_company(
    State(state): State<EntitlementAppState>,
    _admin: AdminAuth,
    Path(company_id): Path<String>,
) -> Result<StatusCode, EntitlementApiError> {
    let company_id: CompanyId = company_id
        .parse()
        .map_err(|_| EntitlementApiError::InvalidCompanyId)?;

    state
        .remove_handler
        .handle(RemoveCompanyCommand { company_id })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /companies/:company_id/visibility - Visibility check for content services
pub async fn get_visibility(VisibleCompany(company_id): VisibleCompany) -> impl IntoResponse {
    Json(VisibilityResponse {
        company_id: company_id.to_string(),
        visible: true,
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Converts webhook failures into the status codes the provider acts on.
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "Webhook handling failed");
        } else {
            tracing::warn!(code = self.0.code(), error = %self.0, "Webhook rejected");
        }
        let body = ErrorResponse::new(self.0.code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}

/// API error type for entitlement queries.
pub enum EntitlementApiError {
    InvalidCompanyId,
    InvalidRequest(&'static str),
    Domain(EntitlementError),
}

impl From<EntitlementError> for EntitlementApiError {
    fn from(err: EntitlementError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for EntitlementApiError {
    fn into_response(self) -> Response {
        let err = match self {
            EntitlementApiError::InvalidCompanyId => {
                let body = ErrorResponse::new("VALIDATION_FAILED", "Invalid company id");
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            EntitlementApiError::InvalidRequest(message) => {
                let body = ErrorResponse::new("VALIDATION_FAILED", message);
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            EntitlementApiError::Domain(err) => err,
        };

        let (status, error_code) = match &err {
            EntitlementError::CompanyNotFound(_) => (StatusCode::NOT_FOUND, "COMPANY_NOT_FOUND"),
            EntitlementError::AlreadyProvisioned(_) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            EntitlementError::BillingProvider(_) => {
                (StatusCode::BAD_GATEWAY, "BILLING_PROVIDER_ERROR")
            }
            EntitlementError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = ErrorResponse::new(error_code, err.message());
        (status, Json(body)).into_response()
    }
}

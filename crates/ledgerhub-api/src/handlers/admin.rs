//! Platform administration handlers. All require a system administrator.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use ledgerhub_auth::subscription::ProvisionTenant;
use ledgerhub_entity::tenant::{LifecycleEvent, TenantStatus};

use crate::dto::request::{CreateTenantRequest, RecordPaymentRequest, UnlockRequest};
use crate::dto::response::{ApiResponse, TenantResponse, TenantStatusResponse, UnlockResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/admin/login-attempts/unlock
pub async fn unlock_login_attempts(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UnlockRequest>,
) -> Result<Json<ApiResponse<UnlockResponse>>, ApiError> {
    req.validate()?;
    let cleared = state
        .session_manager
        .unlock_login_attempts(
            &auth,
            req.email.as_deref(),
            req.ip_address.as_deref(),
            &req.reason,
            Utc::now(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(UnlockResponse { cleared })))
}

/// POST /api/admin/tenants
pub async fn create_tenant(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TenantResponse>>), ApiError> {
    req.validate()?;
    let admin = state.session_manager.require_system_admin(&auth).await?;

    let tenant = state
        .lifecycle
        .provision(
            &ProvisionTenant {
                name: req.name,
                owner_id: req.owner_id.unwrap_or(admin.id),
            },
            Utc::now(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(TenantResponse::from(tenant))),
    ))
}

/// POST /api/admin/tenants/{id}/payments
pub async fn record_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tenant_id): Path<Uuid>,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<Json<ApiResponse<TenantStatusResponse>>, ApiError> {
    state.session_manager.require_system_admin(&auth).await?;
    let status = state
        .lifecycle
        .record_payment(tenant_id, req.current_period_end, Utc::now())
        .await?;
    Ok(Json(ApiResponse::ok(TenantStatusResponse { tenant_id, status })))
}

/// POST /api/admin/tenants/{id}/cancel
///
/// Cancellation is terminal; a cancelled tenant cannot be cancelled again
/// or revived by a payment.
pub async fn cancel_tenant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<ApiResponse<TenantStatusResponse>>, ApiError> {
    state.session_manager.require_system_admin(&auth).await?;
    let status = state
        .lifecycle
        .advance(tenant_id, LifecycleEvent::Cancelled, Utc::now())
        .await?
        .unwrap_or(TenantStatus::Cancelled);
    Ok(Json(ApiResponse::ok(TenantStatusResponse { tenant_id, status })))
}

//! Auth handlers: login, refresh, logout, switching and password change.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use validator::Validate;

use crate::dto::request::{
    ChangePasswordRequest, LoginRequest, LogoutRequest, RefreshRequest, SwitchCompanyRequest,
    SwitchTenantRequest,
};
use crate::dto::response::{
    AccessTokenResponse, ApiResponse, ContextResponse, MeResponse, MessageResponse,
    PasswordChangedResponse, TenantListResponse, TokenResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ClientMeta};
use crate::state::AppState;

use ledgerhub_auth::session::SwitchResult;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ClientMeta(mut client): ClientMeta,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    req.validate()?;
    if req.device_name.is_some() {
        client.device_name = req.device_name;
    }

    let result = state
        .session_manager
        .login(&req.email, &req.password, &client, Utc::now())
        .await?;

    Ok(Json(ApiResponse::ok(TokenResponse::new(
        result.session,
        result.identity,
        result.gate,
    ))))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    req.validate()?;
    let rotated = state
        .session_manager
        .refresh(&req.refresh_token, &client, Utc::now())
        .await?;

    Ok(Json(ApiResponse::ok(TokenResponse::new(
        rotated.session,
        rotated.identity.summary(),
        rotated.gate,
    ))))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    req.validate()?;
    state
        .session_manager
        .logout(&req.refresh_token, Utc::now())
        .await?;

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Logged out successfully".to_string(),
    })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let identity = state
        .session_manager
        .current_identity(auth.identity_id())
        .await?;
    Ok(Json(ApiResponse::ok(MeResponse::new(identity, &auth))))
}

/// GET /api/auth/tenants
pub async fn list_tenants(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<TenantListResponse>>, ApiError> {
    let tenants = state
        .session_manager
        .list_tenants(auth.identity_id())
        .await?;
    Ok(Json(ApiResponse::ok(TenantListResponse {
        current_tenant_id: auth.tenant_id(),
        tenants,
    })))
}

/// POST /api/auth/switch-tenant
pub async fn switch_tenant(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SwitchTenantRequest>,
) -> Result<Json<ApiResponse<AccessTokenResponse>>, ApiError> {
    let result = state
        .session_manager
        .switch_tenant(&auth, req.tenant_id, Utc::now())
        .await?;
    Ok(Json(ApiResponse::ok(switched(result))))
}

/// POST /api/auth/switch-company
pub async fn switch_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SwitchCompanyRequest>,
) -> Result<Json<ApiResponse<AccessTokenResponse>>, ApiError> {
    let result = state
        .session_manager
        .switch_company(&auth, req.company_id, Utc::now())
        .await?;
    Ok(Json(ApiResponse::ok(switched(result))))
}

fn switched(result: SwitchResult) -> AccessTokenResponse {
    AccessTokenResponse {
        access_token: result.access.token,
        token_type: "Bearer",
        access_expires_at: result.access.expires_at,
        context: ContextResponse::from(&result.context),
        warning: result.gate.warning(),
    }
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<PasswordChangedResponse>>, ApiError> {
    req.validate()?;
    let revoked = state
        .session_manager
        .change_password(
            auth.identity_id(),
            &req.current_password,
            &req.new_password,
            Utc::now(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(PasswordChangedResponse {
        revoked_sessions: revoked,
    })))
}

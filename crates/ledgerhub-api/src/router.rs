//! Route definitions for the LedgerHub HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`. Public
//! routes take no token; the rest sit behind `require_auth`, and tenant
//! data routes additionally behind the subscription gate.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the `/api` router with all routes and route-level middleware.
pub fn build_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .merge(session_routes())
        .merge(admin_routes())
        .merge(tenant_routes(state.clone()))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let api_routes = Router::new()
        .merge(public_routes())
        .merge(authenticated);

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Login, refresh, logout and health. No token required.
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/health", get(handlers::health::health))
}

/// Identity-level endpoints. Not gated by subscription so a blocked
/// tenant's users can still switch away or change their password.
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/tenants", get(handlers::auth::list_tenants))
        .route("/auth/switch-tenant", post(handlers::auth::switch_tenant))
        .route("/auth/switch-company", post(handlers::auth::switch_company))
        .route("/auth/change-password", post(handlers::auth::change_password))
}

/// Platform administration.
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/login-attempts/unlock",
            post(handlers::admin::unlock_login_attempts),
        )
        .route("/admin/tenants", post(handlers::admin::create_tenant))
        .route(
            "/admin/tenants/{id}/payments",
            post(handlers::admin::record_payment),
        )
        .route(
            "/admin/tenants/{id}/cancel",
            post(handlers::admin::cancel_tenant),
        )
}

/// Tenant business data, behind the subscription gate.
fn tenant_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/tenant/companies", get(handlers::tenant::list_companies))
        .route("/tenant/companies/{id}", get(handlers::tenant::get_company))
        .route("/tenant/billing", get(handlers::tenant::billing_standing))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::subscription::require_active_subscription,
        ))
}

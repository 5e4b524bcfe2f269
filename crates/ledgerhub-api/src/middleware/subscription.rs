//! Subscription gate for tenant-scoped routes.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use ledgerhub_auth::RequestIdentity;
use ledgerhub_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Response header carrying the grace-period warning.
pub const SUBSCRIPTION_WARNING_HEADER: &str = "x-subscription-warning";

/// Blocks requests whose tenant is not in good standing.
///
/// Must run after [`require_auth`](super::auth::require_auth). Past-due
/// tenants inside their grace period pass with a warning header.
pub async fn require_active_subscription(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tenant_id = request
        .extensions()
        .get::<RequestIdentity>()
        .map(RequestIdentity::tenant_id)
        .ok_or_else(|| AppError::authentication("Authentication required"))?;

    let outcome = state.gate.check(tenant_id, Utc::now()).await?;
    request.extensions_mut().insert(outcome);

    let mut response = next.run(request).await;
    if let Some(warning) = outcome.warning() {
        response
            .headers_mut()
            .insert(SUBSCRIPTION_WARNING_HEADER, HeaderValue::from_static(warning));
    }
    Ok(response)
}

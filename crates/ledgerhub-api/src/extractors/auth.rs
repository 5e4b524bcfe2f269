//! `AuthUser` extractor: the verified identity behind the bearer token.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use ledgerhub_auth::RequestIdentity;
use ledgerhub_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated identity available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestIdentity);

impl AuthUser {
    /// Returns the inner `RequestIdentity`.
    pub fn identity(&self) -> &RequestIdentity {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestIdentity;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Return the token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))
}

/// Decode the bearer token into a request identity.
pub(crate) fn authenticate(parts: &Parts, state: &AppState) -> Result<RequestIdentity, AppError> {
    let token = bearer_token(parts)?;
    let claims = state.tokens.validate_access_token(token)?;
    Ok(RequestIdentity::from(claims))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already verified by the route layer
        if let Some(identity) = parts.extensions.get::<RequestIdentity>() {
            return Ok(AuthUser(identity.clone()));
        }
        Ok(AuthUser(authenticate(parts, state)?))
    }
}

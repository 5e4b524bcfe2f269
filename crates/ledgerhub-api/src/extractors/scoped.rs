//! `ScopedDb` extractor: a database handle bound to the caller's tenant.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use ledgerhub_database::TenantDb;

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Tenant-scoped database handle for the authenticated caller.
///
/// Scoped to the active company when the token carries one.
pub struct ScopedDb(pub TenantDb);

impl std::ops::Deref for ScopedDb {
    type Target = TenantDb;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for ScopedDb {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(ScopedDb(state.db.scoped(user.scope())))
    }
}

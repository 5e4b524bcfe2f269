//! Tenant-scoped handlers. Every query goes through the caller's
//! `TenantDb`, so rows of other tenants are never visible.

use axum::Json;
use axum::extract::{Extension, Path, State};
use uuid::Uuid;

use ledgerhub_auth::{GateOutcome, Permission};
use ledgerhub_core::error::AppError;
use ledgerhub_database::Filter;
use ledgerhub_entity::company::Company;

use crate::dto::response::{ApiResponse, BillingStandingResponse, CompanyResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ScopedDb};
use crate::state::AppState;

/// Companies the caller may see: all of them with tenant-level company
/// management, otherwise only the granted ones.
fn visibility(auth: &AuthUser, state: &AppState) -> Option<Vec<Uuid>> {
    if auth.has(Permission::ManageCompanies, &state.policies) {
        None
    } else {
        Some(auth.companies().iter().map(|c| c.company_id).collect())
    }
}

/// GET /api/tenant/companies
pub async fn list_companies(
    State(state): State<AppState>,
    auth: AuthUser,
    ScopedDb(db): ScopedDb,
) -> Result<Json<ApiResponse<Vec<CompanyResponse>>>, ApiError> {
    let mut filter = Filter::new();
    if let Some(ids) = visibility(&auth, &state) {
        if ids.is_empty() {
            return Ok(Json(ApiResponse::ok(Vec::new())));
        }
        filter = filter.is_in("id", ids);
    }

    let companies = db
        .fetch_all::<Company>(&filter.order_by("name"))
        .await?
        .into_iter()
        .map(|c| {
            let role = auth.company_role(c.id);
            CompanyResponse::new(c, role)
        })
        .collect();

    Ok(Json(ApiResponse::ok(companies)))
}

/// GET /api/tenant/companies/{id}
pub async fn get_company(
    State(state): State<AppState>,
    auth: AuthUser,
    ScopedDb(db): ScopedDb,
    Path(company_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CompanyResponse>>, ApiError> {
    let visible = visibility(&auth, &state).is_none_or(|ids| ids.contains(&company_id));
    let company = if visible {
        db.fetch_by_id::<Company>(company_id).await?
    } else {
        None
    };
    let company = company.ok_or_else(|| AppError::not_found("Company not found"))?;

    let role = auth.company_role(company.id);
    Ok(Json(ApiResponse::ok(CompanyResponse::new(company, role))))
}

/// GET /api/tenant/billing
pub async fn billing_standing(
    State(state): State<AppState>,
    auth: AuthUser,
    Extension(gate): Extension<GateOutcome>,
) -> Result<Json<ApiResponse<BillingStandingResponse>>, ApiError> {
    auth.require(Permission::ManageBilling, &state.policies)?;
    Ok(Json(ApiResponse::ok(BillingStandingResponse::new(
        auth.tenant_id(),
        gate,
    ))))
}

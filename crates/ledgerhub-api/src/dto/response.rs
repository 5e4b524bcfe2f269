//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerhub_auth::session::{IssuedSession, SessionContext, TenantChoice};
use ledgerhub_auth::{GateOutcome, RequestIdentity};
use ledgerhub_entity::company::Company;
use ledgerhub_entity::identity::IdentitySummary;
use ledgerhub_entity::membership::{CompanyAccess, Role};
use ledgerhub_entity::tenant::{Tenant, TenantStatus};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Session context echoed back with every minted access token.
#[derive(Debug, Clone, Serialize)]
pub struct ContextResponse {
    pub tenant_id: Uuid,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub companies: Vec<CompanyAccess>,
}

impl From<&SessionContext> for ContextResponse {
    fn from(ctx: &SessionContext) -> Self {
        Self {
            tenant_id: ctx.access.tenant_id,
            role: ctx.access.role,
            company_id: ctx.company_id,
            companies: ctx.access.companies.clone(),
        }
    }
}

/// Login and refresh response.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token. Shown once; only its hash is stored.
    pub refresh_token: String,
    /// Always `"Bearer"`.
    pub token_type: &'static str,
    /// Access token expiration.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration.
    pub refresh_expires_at: DateTime<Utc>,
    /// Authenticated identity.
    pub identity: IdentitySummary,
    #[serde(flatten)]
    pub context: ContextResponse,
    /// `"payment-overdue"` while the tenant is in its grace period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

impl TokenResponse {
    pub fn new(session: IssuedSession, identity: IdentitySummary, gate: GateOutcome) -> Self {
        Self {
            access_token: session.access.token,
            refresh_token: session.refresh.token,
            token_type: "Bearer",
            access_expires_at: session.access.expires_at,
            refresh_expires_at: session.refresh.expires_at,
            identity,
            context: ContextResponse::from(&session.context),
            warning: gate.warning(),
        }
    }
}

/// Tenant or company switch response. The refresh token is unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub access_expires_at: DateTime<Utc>,
    #[serde(flatten)]
    pub context: ContextResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

/// Current identity and the context of the presented token.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub identity: IdentitySummary,
    pub tenant_id: Uuid,
    pub role: Role,
    pub effective_role: Role,
    pub company_id: Option<Uuid>,
    pub companies: Vec<CompanyAccess>,
    pub session_id: Uuid,
}

impl MeResponse {
    pub fn new(identity: IdentitySummary, caller: &RequestIdentity) -> Self {
        Self {
            identity,
            tenant_id: caller.tenant_id(),
            role: caller.role(),
            effective_role: caller.effective_role(),
            company_id: caller.company_id(),
            companies: caller.companies().to_vec(),
            session_id: caller.session_id(),
        }
    }
}

/// Tenants the identity can switch to.
#[derive(Debug, Clone, Serialize)]
pub struct TenantListResponse {
    /// Tenant of the presented token.
    pub current_tenant_id: Uuid,
    pub tenants: Vec<TenantChoice>,
}

/// Tenant summary.
#[derive(Debug, Clone, Serialize)]
pub struct TenantResponse {
    pub id: Uuid,
    pub name: String,
    pub status: TenantStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Tenant> for TenantResponse {
    fn from(t: Tenant) -> Self {
        Self {
            id: t.id,
            name: t.name,
            status: t.status,
            trial_ends_at: t.trial_ends_at,
            created_at: t.created_at,
        }
    }
}

/// Tenant status after a lifecycle change.
#[derive(Debug, Clone, Serialize)]
pub struct TenantStatusResponse {
    pub tenant_id: Uuid,
    pub status: TenantStatus,
}

/// Billing standing of the caller's tenant.
#[derive(Debug, Clone, Serialize)]
pub struct BillingStandingResponse {
    pub tenant_id: Uuid,
    /// `payment-overdue` while inside the grace period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_ends_at: Option<DateTime<Utc>>,
}

impl BillingStandingResponse {
    pub fn new(tenant_id: Uuid, gate: GateOutcome) -> Self {
        let grace_ends_at = match gate {
            GateOutcome::Allowed => None,
            GateOutcome::PaymentOverdue { grace_ends_at } => Some(grace_ends_at),
        };
        Self {
            tenant_id,
            warning: gate.warning(),
            grace_ends_at,
        }
    }
}

/// Company visible to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyResponse {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    /// Caller's role in this company, absent for tenant-level access.
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
}

impl CompanyResponse {
    pub fn new(company: Company, role: Option<Role>) -> Self {
        Self {
            id: company.id,
            name: company.name,
            is_active: company.is_active,
            role,
            created_at: company.created_at,
        }
    }
}

/// Result of an unlock.
#[derive(Debug, Clone, Serialize)]
pub struct UnlockResponse {
    /// Failed attempts cleared.
    pub cleared: u64,
}

/// Result of a password change.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordChangedResponse {
    /// Refresh tokens revoked.
    pub revoked_sessions: u64,
}

/// Generic message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

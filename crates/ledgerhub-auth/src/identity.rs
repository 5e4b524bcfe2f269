//! The authenticated caller of one request.

use uuid::Uuid;

use ledgerhub_core::error::AppError;
use ledgerhub_core::result::AppResult;
use ledgerhub_database::TenantScope;
use ledgerhub_entity::membership::{CompanyAccess, Role};

use crate::jwt::AccessClaims;
use crate::rbac::{Permission, RbacPolicies};

/// Strongly-typed identity of the bearer of a validated access token.
///
/// Built once at the authentication boundary and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    identity_id: Uuid,
    email: String,
    tenant_id: Uuid,
    role: Role,
    company_id: Option<Uuid>,
    companies: Vec<CompanyAccess>,
    session_id: Uuid,
    token_id: Uuid,
}

impl From<AccessClaims> for RequestIdentity {
    fn from(claims: AccessClaims) -> Self {
        Self {
            identity_id: claims.sub,
            email: claims.email,
            tenant_id: claims.tid,
            role: claims.role,
            company_id: claims.cid,
            companies: claims.companies,
            session_id: claims.sid,
            token_id: claims.jti,
        }
    }
}

impl RequestIdentity {
    pub fn identity_id(&self) -> Uuid {
        self.identity_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    /// Tenant-level role.
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn company_id(&self) -> Option<Uuid> {
        self.company_id
    }

    pub fn companies(&self) -> &[CompanyAccess] {
        &self.companies
    }

    /// Refresh-token session the access token was minted from.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// `jti` of the presented access token.
    pub fn token_id(&self) -> Uuid {
        self.token_id
    }

    /// Scope for tenant-filtered database access: the active tenant plus the
    /// active company when one is selected.
    pub fn scope(&self) -> TenantScope {
        match self.company_id {
            Some(company_id) => TenantScope::company(self.tenant_id, company_id),
            None => TenantScope::tenant(self.tenant_id),
        }
    }

    /// Role held in `company_id`, if the token grants it.
    pub fn company_role(&self, company_id: Uuid) -> Option<Role> {
        self.companies
            .iter()
            .find(|c| c.company_id == company_id)
            .map(|c| c.role)
    }

    pub fn can_access_company(&self, company_id: Uuid) -> bool {
        self.company_role(company_id).is_some()
    }

    /// Role that governs the request: the active company's role when one is
    /// selected, otherwise the tenant-level role.
    pub fn effective_role(&self) -> Role {
        self.company_id
            .and_then(|id| self.company_role(id))
            .unwrap_or(self.role)
    }

    pub fn has(&self, permission: Permission, policies: &RbacPolicies) -> bool {
        policies.allows(self.effective_role(), permission)
            || (self.role.is_elevated() && policies.allows(self.role, permission))
    }

    /// Fail with an authorization error unless the caller holds `permission`.
    pub fn require(&self, permission: Permission, policies: &RbacPolicies) -> AppResult<()> {
        if self.has(permission, policies) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Role {} lacks permission {permission:?}",
                self.effective_role()
            )))
        }
    }
}

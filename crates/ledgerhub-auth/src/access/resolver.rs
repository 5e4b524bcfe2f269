//! Resolves which tenants and companies an identity may act in.
//!
//! Tier 1 (`tenant_memberships`) gives a tenant-wide role; `OWNER` and
//! `TENANT_ADMIN` expand to every active company of the tenant. Tier 2
//! (`company_roles`) grants one company at a time. When both exist for the
//! same tenant, an elevated Tier 1 membership takes precedence.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use ledgerhub_core::error::AppError;
use ledgerhub_core::result::AppResult;
use ledgerhub_database::repositories::MembershipRepository;
use ledgerhub_database::{Database, Filter, TenantScope};
use ledgerhub_entity::company::Company;
use ledgerhub_entity::membership::{CompanyAccess, CompanyGrantRow, Role, TenantMembership};

/// A tenant the identity may act in, with its tenant-level role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantGrant {
    pub tenant_id: Uuid,
    pub role: Role,
}

/// Effective access inside one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAccess {
    /// Tenant the access applies to.
    pub tenant_id: Uuid,
    /// Tenant-level role; for Tier 2 access, the role in the first company.
    pub role: Role,
    /// Accessible companies in creation order.
    pub companies: Vec<CompanyAccess>,
}

impl ResolvedAccess {
    /// The company selected when the caller names none.
    pub fn default_company(&self) -> Option<Uuid> {
        self.companies.first().map(|c| c.company_id)
    }

    pub fn grants_company(&self, company_id: Uuid) -> bool {
        self.companies.iter().any(|c| c.company_id == company_id)
    }

    /// Keep `preferred` if still granted, otherwise fall back to the default.
    pub fn pick_company(&self, preferred: Option<Uuid>) -> Option<Uuid> {
        preferred
            .filter(|id| self.grants_company(*id))
            .or_else(|| self.default_company())
    }
}

/// Combine Tier 1 and Tier 2 rows for one tenant.
///
/// `companies` is only consulted for an elevated membership.
pub fn assemble_access(
    tenant_id: Uuid,
    membership: Option<&TenantMembership>,
    companies: &[Company],
    grants: &[CompanyGrantRow],
) -> Option<ResolvedAccess> {
    if let Some(m) = membership.filter(|m| m.is_active && m.role.is_elevated()) {
        let role = Role::from(m.role);
        return Some(ResolvedAccess {
            tenant_id,
            role,
            companies: companies
                .iter()
                .filter(|c| c.is_active && c.tenant_id == tenant_id)
                .map(|c| CompanyAccess {
                    company_id: c.id,
                    role,
                })
                .collect(),
        });
    }

    let first = grants.first()?;
    Some(ResolvedAccess {
        tenant_id,
        role: first.role.into(),
        companies: grants.iter().copied().map(CompanyAccess::from).collect(),
    })
}

/// Resolves tenant and company access for identities.
#[derive(Debug, Clone)]
pub struct AccessResolver {
    db: Database,
    memberships: Arc<MembershipRepository>,
}

impl AccessResolver {
    pub fn new(db: Database, memberships: Arc<MembershipRepository>) -> Self {
        Self { db, memberships }
    }

    /// Every tenant the identity can act in. Elevated memberships come
    /// first in membership order, then tenants reached through company
    /// grants in grant order.
    pub async fn accessible_tenants(&self, identity_id: Uuid) -> AppResult<Vec<TenantGrant>> {
        let memberships = self.memberships.find_tenant_memberships(identity_id).await?;
        let mut grants: Vec<TenantGrant> = memberships
            .iter()
            .filter(|m| m.role.is_elevated())
            .map(|m| TenantGrant {
                tenant_id: m.tenant_id,
                role: m.role.into(),
            })
            .collect();

        for tenant_id in self.memberships.find_granted_tenant_ids(identity_id).await? {
            if grants.iter().any(|g| g.tenant_id == tenant_id) {
                continue;
            }
            let company_grants = self
                .memberships
                .find_company_grants(identity_id, tenant_id)
                .await?;
            if let Some(first) = company_grants.first() {
                grants.push(TenantGrant {
                    tenant_id,
                    role: first.role.into(),
                });
            }
        }

        debug!(identity_id = %identity_id, tenants = grants.len(), "Resolved accessible tenants");
        Ok(grants)
    }

    /// The tenant a fresh login lands in.
    pub async fn resolve_default_tenant(&self, identity_id: Uuid) -> AppResult<TenantGrant> {
        self.accessible_tenants(identity_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::authorization("Identity has no tenant access"))
    }

    /// Effective access of `identity_id` inside `tenant_id`.
    pub async fn resolve_for_tenant(
        &self,
        identity_id: Uuid,
        tenant_id: Uuid,
    ) -> AppResult<ResolvedAccess> {
        let membership = self
            .memberships
            .find_tenant_membership(identity_id, tenant_id)
            .await?;

        let elevated = membership.as_ref().is_some_and(|m| m.role.is_elevated());
        let (companies, grants) = if elevated {
            let companies = self
                .db
                .scoped(TenantScope::tenant(tenant_id))
                .fetch_all::<Company>(
                    &Filter::new()
                        .eq("is_active", true)
                        .order_by("created_at")
                        .order_by("id"),
                )
                .await?;
            (companies, Vec::new())
        } else {
            let grants = self
                .memberships
                .find_company_grants(identity_id, tenant_id)
                .await?;
            (Vec::new(), grants)
        };

        assemble_access(tenant_id, membership.as_ref(), &companies, &grants)
            .ok_or_else(|| AppError::authorization("Identity has no access to this tenant"))
    }
}

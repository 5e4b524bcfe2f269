//! Tenant membership and company role repository implementation.

use uuid::Uuid;

use ledgerhub_core::error::{AppError, ErrorKind};
use ledgerhub_core::result::AppResult;
use ledgerhub_entity::membership::{
    CompanyGrantRow, TenantMembership, TenantRole,
};

use crate::bypass::UnscopedDb;
use crate::transaction::UnitOfWork;

/// Repository for Tier 1 memberships and Tier 2 company grants.
#[derive(Debug, Clone)]
pub struct MembershipRepository {
    db: UnscopedDb,
}

impl MembershipRepository {
    pub fn new(db: UnscopedDb) -> Self {
        Self { db }
    }

    /// Active tenant memberships of an identity, oldest first.
    pub async fn find_tenant_memberships(&self, identity_id: Uuid) -> AppResult<Vec<TenantMembership>> {
        sqlx::query_as::<_, TenantMembership>(
            "SELECT * FROM tenant_memberships WHERE identity_id = $1 AND is_active = TRUE \
             ORDER BY created_at, tenant_id",
        )
        .bind(identity_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find tenant memberships", e))
    }

    /// The active membership of an identity in one tenant.
    pub async fn find_tenant_membership(
        &self,
        identity_id: Uuid,
        tenant_id: Uuid,
    ) -> AppResult<Option<TenantMembership>> {
        sqlx::query_as::<_, TenantMembership>(
            "SELECT * FROM tenant_memberships \
             WHERE identity_id = $1 AND tenant_id = $2 AND is_active = TRUE",
        )
        .bind(identity_id)
        .bind(tenant_id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find tenant membership", e))
    }

    /// Active company grants of an identity inside one tenant, in company
    /// creation order. Grants on inactive companies are excluded.
    pub async fn find_company_grants(
        &self,
        identity_id: Uuid,
        tenant_id: Uuid,
    ) -> AppResult<Vec<CompanyGrantRow>> {
        sqlx::query_as::<_, CompanyGrantRow>(
            "SELECT cr.company_id, cr.role FROM company_roles cr \
             JOIN companies c ON c.id = cr.company_id \
             WHERE cr.identity_id = $1 AND c.tenant_id = $2 \
             AND cr.is_active = TRUE AND c.is_active = TRUE \
             ORDER BY c.created_at, c.id",
        )
        .bind(identity_id)
        .bind(tenant_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find company grants", e))
    }

    /// Tenants reachable only through company grants, ordered by the
    /// earliest grant in each.
    pub async fn find_granted_tenant_ids(&self, identity_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT c.tenant_id FROM company_roles cr \
             JOIN companies c ON c.id = cr.company_id \
             WHERE cr.identity_id = $1 AND cr.is_active = TRUE AND c.is_active = TRUE \
             GROUP BY c.tenant_id ORDER BY MIN(cr.created_at), c.tenant_id",
        )
        .bind(identity_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find granted tenants", e))
    }

    pub async fn add_tenant_member(
        &self,
        uow: &mut UnitOfWork,
        identity_id: Uuid,
        tenant_id: Uuid,
        role: TenantRole,
    ) -> AppResult<TenantMembership> {
        sqlx::query_as::<_, TenantMembership>(
            "INSERT INTO tenant_memberships (identity_id, tenant_id, role) VALUES ($1, $2, $3) \
             ON CONFLICT (identity_id, tenant_id) DO UPDATE SET role = EXCLUDED.role, is_active = TRUE \
             RETURNING *",
        )
        .bind(identity_id)
        .bind(tenant_id)
        .bind(role)
        .fetch_one(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to add tenant member", e))
    }
}

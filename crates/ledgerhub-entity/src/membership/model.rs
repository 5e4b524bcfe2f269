//! Membership entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::{CompanyRole, Role, TenantRole};

/// Tier 1: an identity's role across a whole tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TenantMembership {
    /// Member identity.
    pub identity_id: Uuid,
    /// Tenant the membership applies to.
    pub tenant_id: Uuid,
    /// Tenant-wide role.
    pub role: TenantRole,
    /// Deactivated rows grant nothing.
    pub is_active: bool,
    /// When the membership was granted.
    pub created_at: DateTime<Utc>,
}

/// Projection of an active company grant inside a given tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct CompanyGrantRow {
    /// Company ID.
    pub company_id: Uuid,
    /// Role held in that company.
    pub role: CompanyRole,
}

/// One entry of the company access list embedded in access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyAccess {
    /// Company ID.
    pub company_id: Uuid,
    /// Effective role in that company.
    pub role: Role,
}

impl From<CompanyGrantRow> for CompanyAccess {
    fn from(row: CompanyGrantRow) -> Self {
        Self {
            company_id: row.company_id,
            role: row.role.into(),
        }
    }
}

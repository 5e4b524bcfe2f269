//! Marker trait for tenant-owned tables.

use ledgerhub_entity::company::Company;
use sqlx::FromRow;
use sqlx::postgres::PgRow;

/// A row type stored in a table carrying a tenant column.
///
/// Company-scoped tables additionally name their company column; a
/// [`TenantDb`](super::TenantDb) refuses to touch them without an active
/// company in its scope.
pub trait TenantTable: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    /// Table name.
    const TABLE: &'static str;
    /// Column holding the owning tenant.
    const TENANT_COLUMN: &'static str = "tenant_id";
    /// Column holding the owning company, for company-scoped tables.
    const COMPANY_COLUMN: Option<&'static str> = None;
}

impl TenantTable for Company {
    const TABLE: &'static str = "companies";
}

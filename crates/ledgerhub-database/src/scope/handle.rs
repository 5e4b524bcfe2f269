//! The tenant-scoped query handle.

use ledgerhub_core::{AppError, AppResult};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::filter::{Filter, Value, check_column, check_identifier};
use super::table::TenantTable;

/// The tenant (and optional company) a handle is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TenantScope {
    tenant_id: Uuid,
    company_id: Option<Uuid>,
}

impl TenantScope {
    /// Scope covering a whole tenant.
    pub fn tenant(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            company_id: None,
        }
    }

    /// Scope narrowed to one company of a tenant.
    pub fn company(tenant_id: Uuid, company_id: Uuid) -> Self {
        Self {
            tenant_id,
            company_id: Some(company_id),
        }
    }

    /// Same tenant, narrowed to `company_id`.
    pub fn with_company(self, company_id: Uuid) -> Self {
        Self::company(self.tenant_id, company_id)
    }

    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    pub fn company_id(&self) -> Option<Uuid> {
        self.company_id
    }

    fn reserved<T: TenantTable>() -> Vec<&'static str> {
        let mut reserved = vec![T::TENANT_COLUMN];
        reserved.extend(T::COMPANY_COLUMN);
        reserved
    }

    /// Company predicate for a company-scoped table. A tenant-wide scope
    /// has none and sees every company of the tenant.
    fn company_for<T: TenantTable>(&self) -> Option<(&'static str, Uuid)> {
        T::COMPANY_COLUMN.zip(self.company_id)
    }

    fn check_table<T: TenantTable>() -> AppResult<()> {
        check_identifier(T::TABLE)?;
        check_identifier(T::TENANT_COLUMN)?;
        if let Some(column) = T::COMPANY_COLUMN {
            check_identifier(column)?;
        }
        Ok(())
    }

    /// Append the scope predicate. Must directly follow `WHERE `.
    fn push_scope<T: TenantTable>(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(T::TENANT_COLUMN).push(" = ").push_bind(self.tenant_id);
        if let Some((column, company_id)) = self.company_for::<T>() {
            qb.push(" AND ").push(column).push(" = ").push_bind(company_id);
        }
    }

    fn filtered<T: TenantTable>(
        &self,
        head: &str,
        filter: &Filter,
        with_tail: bool,
    ) -> AppResult<QueryBuilder<'static, Postgres>> {
        Self::check_table::<T>()?;
        filter.check(&Self::reserved::<T>())?;
        let mut qb = QueryBuilder::new(head);
        qb.push(T::TABLE).push(" WHERE ");
        self.push_scope::<T>(&mut qb);
        filter.push_conditions(&mut qb);
        if with_tail {
            filter.push_tail(&mut qb);
        }
        Ok(qb)
    }

    /// Build `SELECT * FROM <table> WHERE <scope> [AND ...]`.
    pub fn select_query<T: TenantTable>(
        &self,
        filter: &Filter,
    ) -> AppResult<QueryBuilder<'static, Postgres>> {
        self.filtered::<T>("SELECT * FROM ", filter, true)
    }

    /// Build `SELECT COUNT(*) FROM <table> WHERE <scope> [AND ...]`.
    pub fn count_query<T: TenantTable>(
        &self,
        filter: &Filter,
    ) -> AppResult<QueryBuilder<'static, Postgres>> {
        self.filtered::<T>("SELECT COUNT(*) FROM ", filter, false)
    }

    /// Build `DELETE FROM <table> WHERE <scope> [AND ...]`.
    pub fn delete_query<T: TenantTable>(
        &self,
        filter: &Filter,
    ) -> AppResult<QueryBuilder<'static, Postgres>> {
        self.filtered::<T>("DELETE FROM ", filter, false)
    }

    /// Build an `INSERT` whose scope columns come from this scope.
    pub fn insert_query<T: TenantTable>(
        &self,
        values: &[(&'static str, Value)],
    ) -> AppResult<QueryBuilder<'static, Postgres>> {
        Self::check_table::<T>()?;
        let reserved = Self::reserved::<T>();
        for (column, _) in values {
            check_column(column, &reserved)?;
        }
        let company = self.company_for::<T>();
        if T::COMPANY_COLUMN.is_some() && company.is_none() {
            return Err(AppError::validation(format!(
                "Inserting into '{}' requires a company-scoped handle",
                T::TABLE
            )));
        }

        let mut qb = QueryBuilder::new("INSERT INTO ");
        qb.push(T::TABLE).push(" (").push(T::TENANT_COLUMN);
        if let Some((column, _)) = company {
            qb.push(", ").push(column);
        }
        for (column, _) in values {
            qb.push(", ").push(*column);
        }
        qb.push(") VALUES (").push_bind(self.tenant_id);
        if let Some((_, company_id)) = company {
            qb.push(", ").push_bind(company_id);
        }
        for (_, value) in values {
            qb.push(", ");
            value.push_bind(&mut qb);
        }
        qb.push(") RETURNING *");
        Ok(qb)
    }

    /// Build an `UPDATE` restricted to this scope.
    pub fn update_query<T: TenantTable>(
        &self,
        changes: &[(&'static str, Value)],
        filter: &Filter,
    ) -> AppResult<QueryBuilder<'static, Postgres>> {
        Self::check_table::<T>()?;
        if changes.is_empty() {
            return Err(AppError::validation("Update requires at least one column"));
        }
        let reserved = Self::reserved::<T>();
        for (column, _) in changes {
            check_column(column, &reserved)?;
        }
        filter.check(&reserved)?;

        let mut qb = QueryBuilder::new("UPDATE ");
        qb.push(T::TABLE).push(" SET ");
        for (i, (column, value)) in changes.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*column).push(" = ");
            value.push_bind(&mut qb);
        }
        qb.push(" WHERE ");
        self.push_scope::<T>(&mut qb);
        filter.push_conditions(&mut qb);
        Ok(qb)
    }
}

/// Database handle bound to one tenant scope.
///
/// Built only through [`Database::scoped`](crate::Database::scoped).
#[derive(Debug, Clone)]
pub struct TenantDb {
    pool: PgPool,
    scope: TenantScope,
}

impl TenantDb {
    pub(crate) fn new(pool: PgPool, scope: TenantScope) -> Self {
        Self { pool, scope }
    }

    /// The scope every statement is restricted to.
    pub fn scope(&self) -> TenantScope {
        self.scope
    }

    /// Derive a handle narrowed to one company of the same tenant.
    pub fn with_company(&self, company_id: Uuid) -> Self {
        Self::new(self.pool.clone(), self.scope.with_company(company_id))
    }

    pub async fn fetch_all<T: TenantTable>(&self, filter: &Filter) -> AppResult<Vec<T>> {
        let mut qb = self.scope.select_query::<T>(filter)?;
        debug!(table = T::TABLE, tenant_id = %self.scope.tenant_id, "Scoped select");
        qb.build_query_as::<T>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx(format!("Failed to query {}", T::TABLE), e))
    }

    pub async fn fetch_optional<T: TenantTable>(&self, filter: &Filter) -> AppResult<Option<T>> {
        let mut qb = self.scope.select_query::<T>(filter)?;
        qb.build_query_as::<T>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx(format!("Failed to query {}", T::TABLE), e))
    }

    /// Fetch one row by primary key; rows of other tenants read as absent.
    pub async fn fetch_by_id<T: TenantTable>(&self, id: Uuid) -> AppResult<Option<T>> {
        self.fetch_optional::<T>(&Filter::by_id(id)).await
    }

    pub async fn count<T: TenantTable>(&self, filter: &Filter) -> AppResult<i64> {
        let mut qb = self.scope.count_query::<T>(filter)?;
        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx(format!("Failed to count {}", T::TABLE), e))
    }

    /// Insert a row; the scope columns are filled from the handle.
    pub async fn insert<T: TenantTable>(&self, values: &[(&'static str, Value)]) -> AppResult<T> {
        let mut qb = self.scope.insert_query::<T>(values)?;
        debug!(table = T::TABLE, tenant_id = %self.scope.tenant_id, "Scoped insert");
        qb.build_query_as::<T>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx(format!("Failed to insert into {}", T::TABLE), e))
    }

    /// Update matching rows inside the scope. Returns rows affected.
    pub async fn update<T: TenantTable>(
        &self,
        changes: &[(&'static str, Value)],
        filter: &Filter,
    ) -> AppResult<u64> {
        let mut qb = self.scope.update_query::<T>(changes, filter)?;
        debug!(table = T::TABLE, tenant_id = %self.scope.tenant_id, "Scoped update");
        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx(format!("Failed to update {}", T::TABLE), e))?;
        Ok(result.rows_affected())
    }

    /// Delete matching rows inside the scope. Returns rows affected.
    pub async fn delete<T: TenantTable>(&self, filter: &Filter) -> AppResult<u64> {
        let mut qb = self.scope.delete_query::<T>(filter)?;
        debug!(table = T::TABLE, tenant_id = %self.scope.tenant_id, "Scoped delete");
        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx(format!("Failed to delete from {}", T::TABLE), e))?;
        Ok(result.rows_affected())
    }
}

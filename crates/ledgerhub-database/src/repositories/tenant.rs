//! Tenant repository implementation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ledgerhub_core::error::{AppError, ErrorKind};
use ledgerhub_core::result::AppResult;
use ledgerhub_entity::tenant::{CreateTenant, Tenant, TenantStatus};

use crate::bypass::UnscopedDb;
use crate::transaction::UnitOfWork;

/// Repository for tenant rows.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    db: UnscopedDb,
}

impl TenantRepository {
    pub fn new(db: UnscopedDb) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Tenant>> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find tenant", e))
    }

    /// Fetch several tenants, preserving no particular order.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Tenant>> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find tenants", e))
    }

    pub async fn create(&self, uow: &mut UnitOfWork, data: &CreateTenant) -> AppResult<Tenant> {
        sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (name, status, trial_ends_at) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&data.name)
        .bind(data.status)
        .bind(data.trial_ends_at)
        .fetch_one(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to create tenant", e))
    }

    /// Point the tenant at its current subscription record.
    pub async fn set_subscription(
        &self,
        uow: &mut UnitOfWork,
        tenant_id: Uuid,
        subscription_id: Uuid,
    ) -> AppResult<()> {
        sqlx::query("UPDATE tenants SET subscription_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(subscription_id)
            .bind(tenant_id)
            .execute(uow.conn()?)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to link subscription", e))?;
        Ok(())
    }

    /// Lock the tenant row for a lifecycle change.
    pub async fn lock_by_id(&self, uow: &mut UnitOfWork, id: Uuid) -> AppResult<Option<Tenant>> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(uow.conn()?)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to lock tenant", e))
    }

    /// Move a tenant from `from` to `to`. Returns false if the tenant was
    /// no longer in `from`.
    pub async fn transition_status(
        &self,
        uow: &mut UnitOfWork,
        id: Uuid,
        from: TenantStatus,
        to: TenantStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE tenants SET status = $1, updated_at = NOW() WHERE id = $2 AND status = $3",
        )
        .bind(to)
        .bind(id)
        .bind(from)
        .execute(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to update tenant status", e))?;
        Ok(result.rows_affected() == 1)
    }

    /// Trials whose end date has passed.
    pub async fn find_elapsed_trials(&self, now: DateTime<Utc>) -> AppResult<Vec<Tenant>> {
        sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE status = 'TRIAL' AND trial_ends_at <= $1",
        )
        .bind(now)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find elapsed trials", e))
    }

    /// Active tenants whose subscription period ended.
    pub async fn find_missed_billing_cycles(&self, now: DateTime<Utc>) -> AppResult<Vec<Tenant>> {
        sqlx::query_as::<_, Tenant>(
            "SELECT t.* FROM tenants t JOIN subscriptions s ON s.id = t.subscription_id \
             WHERE t.status = 'ACTIVE' AND s.status = 'ACTIVE' AND s.current_period_end <= $1",
        )
        .bind(now)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find missed billing cycles", e))
    }

    /// Past-due tenants whose grace period ended.
    pub async fn find_elapsed_grace_periods(&self, now: DateTime<Utc>) -> AppResult<Vec<Tenant>> {
        sqlx::query_as::<_, Tenant>(
            "SELECT t.* FROM tenants t JOIN subscriptions s ON s.id = t.subscription_id \
             WHERE t.status = 'PAST_DUE' AND s.grace_period_ends_at <= $1",
        )
        .bind(now)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find elapsed grace periods", e))
    }
}

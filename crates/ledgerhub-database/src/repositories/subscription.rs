//! Subscription repository implementation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ledgerhub_core::error::{AppError, ErrorKind};
use ledgerhub_core::result::AppResult;
use ledgerhub_entity::subscription::{CreateSubscription, Subscription, SubscriptionStatus};
use ledgerhub_entity::tenant::Tenant;

use crate::bypass::UnscopedDb;
use crate::transaction::UnitOfWork;

/// Repository for subscription records.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    db: UnscopedDb,
}

impl SubscriptionRepository {
    pub fn new(db: UnscopedDb) -> Self {
        Self { db }
    }

    /// The subscription record the tenant currently points at.
    pub async fn find_for_tenant(&self, tenant: &Tenant) -> AppResult<Option<Subscription>> {
        let Some(subscription_id) = tenant.subscription_id else {
            return Ok(None);
        };
        sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE id = $1 AND tenant_id = $2",
        )
        .bind(subscription_id)
        .bind(tenant.id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find subscription", e))
    }

    /// Lock the tenant's current subscription record inside `uow`.
    pub async fn lock_for_tenant(
        &self,
        uow: &mut UnitOfWork,
        tenant: &Tenant,
    ) -> AppResult<Option<Subscription>> {
        let Some(subscription_id) = tenant.subscription_id else {
            return Ok(None);
        };
        sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(subscription_id)
        .bind(tenant.id)
        .fetch_optional(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to lock subscription", e))
    }

    pub async fn create(&self, uow: &mut UnitOfWork, data: &CreateSubscription) -> AppResult<Subscription> {
        sqlx::query_as::<_, Subscription>(
            "INSERT INTO subscriptions \
             (tenant_id, status, current_period_start, current_period_end, grace_period_ends_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(data.tenant_id)
        .bind(data.status)
        .bind(data.current_period_start)
        .bind(data.current_period_end)
        .bind(data.grace_period_ends_at)
        .fetch_one(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to create subscription", e))
    }

    /// Mark a subscription past due with the given grace end.
    pub async fn mark_past_due(
        &self,
        uow: &mut UnitOfWork,
        id: Uuid,
        grace_ends_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET status = $1, grace_period_ends_at = $2, updated_at = NOW() \
             WHERE id = $3",
        )
        .bind(SubscriptionStatus::PastDue)
        .bind(grace_ends_at)
        .bind(id)
        .execute(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to update subscription", e))?;
        Ok(())
    }
}

//! Tenant provisioning and lifecycle transitions.
//!
//! Every change locks the tenant row, applies [`TenantStatus::apply`] and
//! writes the new status together with any subscription change in one
//! transaction.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use ledgerhub_core::config::SubscriptionConfig;
use ledgerhub_core::error::AppError;
use ledgerhub_core::result::AppResult;
use ledgerhub_database::repositories::{MembershipRepository, SubscriptionRepository, TenantRepository};
use ledgerhub_database::{UnitOfWork, UnscopedDb};
use ledgerhub_entity::membership::TenantRole;
use ledgerhub_entity::subscription::{CreateSubscription, SubscriptionStatus};
use ledgerhub_entity::tenant::{CreateTenant, LifecycleEvent, Tenant, TenantStatus};

/// Input for creating a tenant.
#[derive(Debug, Clone)]
pub struct ProvisionTenant {
    /// Organization name.
    pub name: String,
    /// Identity that becomes the tenant's `OWNER`.
    pub owner_id: Uuid,
}

/// Creates tenants and moves them through their lifecycle.
#[derive(Debug, Clone)]
pub struct TenantLifecycle {
    db: UnscopedDb,
    tenants: Arc<TenantRepository>,
    subscriptions: Arc<SubscriptionRepository>,
    memberships: Arc<MembershipRepository>,
    trial_period: Duration,
    grace_period: Duration,
}

impl TenantLifecycle {
    pub fn new(
        db: UnscopedDb,
        tenants: Arc<TenantRepository>,
        subscriptions: Arc<SubscriptionRepository>,
        memberships: Arc<MembershipRepository>,
        config: &SubscriptionConfig,
    ) -> Self {
        Self {
            db,
            tenants,
            subscriptions,
            memberships,
            trial_period: days(config.trial_period_days),
            grace_period: days(config.grace_period_days),
        }
    }

    /// Create a `TRIAL` tenant owned by `input.owner_id`.
    pub async fn provision(&self, input: &ProvisionTenant, now: DateTime<Utc>) -> AppResult<Tenant> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Tenant name must not be empty"));
        }

        let mut uow = self.db.begin().await?;
        let tenant = self
            .tenants
            .create(
                &mut uow,
                &CreateTenant {
                    name: name.to_string(),
                    status: TenantStatus::Trial,
                    trial_ends_at: Some(now + self.trial_period),
                },
            )
            .await?;
        self.memberships
            .add_tenant_member(&mut uow, input.owner_id, tenant.id, TenantRole::Owner)
            .await?;
        uow.commit().await?;

        info!(tenant_id = %tenant.id, owner_id = %input.owner_id, "Tenant provisioned");
        Ok(tenant)
    }

    /// Record a cleared payment covering the period `now..period_end`.
    pub async fn record_payment(
        &self,
        tenant_id: Uuid,
        period_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<TenantStatus> {
        if period_end <= now {
            return Err(AppError::validation("Billing period must end in the future"));
        }

        let mut uow = self.db.begin().await?;
        let tenant = self.lock(&mut uow, tenant_id).await?;
        let next = tenant.status.apply(LifecycleEvent::PaymentSucceeded)?;

        let subscription = self
            .subscriptions
            .create(
                &mut uow,
                &CreateSubscription {
                    tenant_id,
                    status: SubscriptionStatus::Active,
                    current_period_start: now,
                    current_period_end: period_end,
                    grace_period_ends_at: None,
                },
            )
            .await?;
        self.tenants
            .set_subscription(&mut uow, tenant_id, subscription.id)
            .await?;
        self.write_status(&mut uow, &tenant, next).await?;
        uow.commit().await?;

        info!(tenant_id = %tenant_id, from = %tenant.status, to = %next, "Payment recorded");
        Ok(next)
    }

    /// Apply a time-driven or administrative event.
    ///
    /// Time-driven events re-check their deadline after the row lock, so a
    /// payment that lands between a sweep's query and its update wins.
    /// Returns `None` when the deadline no longer applies.
    pub async fn advance(
        &self,
        tenant_id: Uuid,
        event: LifecycleEvent,
        now: DateTime<Utc>,
    ) -> AppResult<Option<TenantStatus>> {
        if event == LifecycleEvent::PaymentSucceeded {
            return Err(AppError::validation("Payments are applied with record_payment"));
        }

        let mut uow = self.db.begin().await?;
        let tenant = self.lock(&mut uow, tenant_id).await?;
        let subscription = self
            .subscriptions
            .lock_for_tenant(&mut uow, &tenant)
            .await?;

        let due = match event {
            LifecycleEvent::TrialElapsed => tenant.trial_ends_at.is_some_and(|t| t <= now),
            LifecycleEvent::BillingCycleMissed => subscription
                .as_ref()
                .is_some_and(|s| s.status == SubscriptionStatus::Active && s.current_period_end <= now),
            LifecycleEvent::GracePeriodElapsed => subscription
                .as_ref()
                .and_then(|s| s.grace_period_ends_at)
                .is_some_and(|g| g <= now),
            LifecycleEvent::Cancelled | LifecycleEvent::PaymentSucceeded => true,
        };
        if !due {
            uow.rollback().await?;
            return Ok(None);
        }

        let next = tenant.status.apply(event)?;
        if event == LifecycleEvent::BillingCycleMissed {
            if let Some(s) = &subscription {
                self.subscriptions
                    .mark_past_due(&mut uow, s.id, now + self.grace_period)
                    .await?;
            }
        }
        self.write_status(&mut uow, &tenant, next).await?;
        uow.commit().await?;

        info!(tenant_id = %tenant_id, event = ?event, from = %tenant.status, to = %next, "Tenant lifecycle transition");
        Ok(Some(next))
    }

    async fn lock(&self, uow: &mut UnitOfWork, tenant_id: Uuid) -> AppResult<Tenant> {
        self.tenants
            .lock_by_id(uow, tenant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Tenant not found"))
    }

    async fn write_status(&self, uow: &mut UnitOfWork, tenant: &Tenant, next: TenantStatus) -> AppResult<()> {
        if next == tenant.status {
            return Ok(());
        }
        if !self
            .tenants
            .transition_status(uow, tenant.id, tenant.status, next)
            .await?
        {
            return Err(AppError::conflict("Tenant status changed concurrently"));
        }
        Ok(())
    }
}

fn days(n: u64) -> Duration {
    Duration::days(i64::try_from(n).unwrap_or(36_500).min(36_500))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_clamps_large_values() {
        assert_eq!(days(14), Duration::days(14));
        assert_eq!(days(u64::MAX), Duration::days(36_500));
    }
}

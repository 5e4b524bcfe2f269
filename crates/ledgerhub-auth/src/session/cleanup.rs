//! Periodic maintenance: refresh token retention and time-driven tenant
//! lifecycle transitions.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use ledgerhub_core::config::SessionConfig;
use ledgerhub_core::result::AppResult;
use ledgerhub_database::repositories::{RefreshTokenRepository, TenantRepository};
use ledgerhub_entity::tenant::{LifecycleEvent, Tenant};

use crate::subscription::TenantLifecycle;

/// Counts from one maintenance cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Revoked rows deleted after the retention window.
    pub purged_tokens: u64,
    /// Rows revoked because their expiry passed.
    pub expired_tokens: u64,
    /// `TRIAL` tenants moved to `EXPIRED`.
    pub expired_trials: u32,
    /// `ACTIVE` tenants moved to `PAST_DUE`.
    pub past_due: u32,
    /// `PAST_DUE` tenants moved to `SUSPENDED`.
    pub suspended: u32,
}

/// Runs the maintenance cycle on an interval.
#[derive(Debug, Clone)]
pub struct SessionCleanup {
    refresh_tokens: Arc<RefreshTokenRepository>,
    tenants: Arc<TenantRepository>,
    lifecycle: Arc<TenantLifecycle>,
    retention: Duration,
    interval: StdDuration,
}

impl SessionCleanup {
    pub fn new(
        refresh_tokens: Arc<RefreshTokenRepository>,
        tenants: Arc<TenantRepository>,
        lifecycle: Arc<TenantLifecycle>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            refresh_tokens,
            tenants,
            lifecycle,
            retention: Duration::days(
                i64::try_from(config.revoked_retention_days)
                    .unwrap_or(36_500)
                    .min(36_500),
            ),
            interval: StdDuration::from_secs(config.sweep_interval_minutes.saturating_mul(60).max(1)),
        }
    }

    /// Runs one cleanup cycle.
    pub async fn run_cleanup(&self, now: DateTime<Utc>) -> AppResult<CleanupReport> {
        let mut report = CleanupReport {
            purged_tokens: self
                .refresh_tokens
                .delete_revoked_before(now - self.retention)
                .await?,
            expired_tokens: self.refresh_tokens.revoke_expired(now).await?,
            ..CleanupReport::default()
        };

        let trials = self.tenants.find_elapsed_trials(now).await?;
        report.expired_trials = self
            .advance_all(&trials, LifecycleEvent::TrialElapsed, now)
            .await;

        let missed = self.tenants.find_missed_billing_cycles(now).await?;
        report.past_due = self
            .advance_all(&missed, LifecycleEvent::BillingCycleMissed, now)
            .await;

        let lapsed = self.tenants.find_elapsed_grace_periods(now).await?;
        report.suspended = self
            .advance_all(&lapsed, LifecycleEvent::GracePeriodElapsed, now)
            .await;

        if report != CleanupReport::default() {
            info!(
                purged_tokens = report.purged_tokens,
                expired_tokens = report.expired_tokens,
                expired_trials = report.expired_trials,
                past_due = report.past_due,
                suspended = report.suspended,
                "Maintenance cycle completed"
            );
        }
        Ok(report)
    }

    /// Apply `event` to each tenant; one tenant failing does not stop the
    /// rest. Returns how many moved.
    async fn advance_all(
        &self,
        tenants: &[Tenant],
        event: LifecycleEvent,
        now: DateTime<Utc>,
    ) -> u32 {
        let mut moved = 0u32;
        for tenant in tenants {
            match self.lifecycle.advance(tenant.id, event, now).await {
                Ok(Some(_)) => moved += 1,
                Ok(None) => {}
                Err(e) => {
                    error!(tenant_id = %tenant.id, event = ?event, error = %e, "Lifecycle transition failed");
                }
            }
        }
        moved
    }

    /// Run the cycle every `sweep_interval_minutes` until `shutdown` flips
    /// to true.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_cleanup(Utc::now()).await {
                            error!(error = %e, "Maintenance cycle failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Maintenance task stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}

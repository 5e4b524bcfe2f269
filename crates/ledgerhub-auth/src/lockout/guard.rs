//! Brute-force guard backed by the login attempt audit trail.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use ledgerhub_core::result::AppResult;
use ledgerhub_database::repositories::LoginAttemptRepository;
use ledgerhub_entity::login_attempt::{FailureReason, FailureSummary, NewLoginAttempt};

use super::policy::{LockStatus, LockoutPolicy};

/// Outcome of one login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Credentials verified.
    Success,
    /// Credentials rejected.
    Failure(FailureReason),
}

/// Tracks failed logins per email and per client IP.
#[derive(Debug, Clone)]
pub struct BruteForceGuard {
    attempts: Arc<LoginAttemptRepository>,
    policy: LockoutPolicy,
}

impl BruteForceGuard {
    pub fn new(attempts: Arc<LoginAttemptRepository>, policy: LockoutPolicy) -> Self {
        Self { attempts, policy }
    }

    /// Check whether the email or the IP is locked.
    ///
    /// Each key is evaluated on its own; the stricter result is returned.
    /// Successes never reset the count.
    pub async fn check_lock(
        &self,
        email: &str,
        ip_address: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<LockStatus> {
        let since = now - self.policy.lookback();

        let by_email = self.attempts.failures_by_email(email, since).await?;
        let mut status = self.evaluate(by_email, now);

        if let Some(ip) = ip_address {
            let by_ip = self.attempts.failures_by_ip(ip, since).await?;
            status = status.most_restrictive(self.evaluate(by_ip, now));
        }

        if status.locked {
            warn!(
                email = %email,
                ip = ?ip_address,
                tier = status.tier,
                retry_after = status.retry_after_seconds,
                "Login blocked by lockout"
            );
        }
        Ok(status)
    }

    fn evaluate(&self, summary: FailureSummary, now: DateTime<Utc>) -> LockStatus {
        let count = u32::try_from(summary.failure_count).unwrap_or(u32::MAX);
        self.policy.evaluate(count, summary.last_failure_at, now)
    }

    /// Record an attempt. Failures to write are logged, never surfaced.
    pub async fn record_attempt(
        &self,
        email: &str,
        ip_address: Option<&str>,
        outcome: AttemptOutcome,
        now: DateTime<Utc>,
    ) {
        let (success, failure_reason) = match outcome {
            AttemptOutcome::Success => (true, None),
            AttemptOutcome::Failure(reason) => (false, Some(reason)),
        };
        let attempt = NewLoginAttempt {
            email: email.to_string(),
            ip_address: ip_address.map(str::to_string),
            success,
            failure_reason,
            attempted_at: now,
        };
        if let Err(e) = self.attempts.record(&attempt).await {
            error!(email = %email, error = %e, "Failed to record login attempt");
        }
    }

    /// Clear uncleared failures for an email and/or IP.
    pub async fn unlock(
        &self,
        email: Option<&str>,
        ip_address: Option<&str>,
        admin_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let cleared = self
            .attempts
            .unlock(email, ip_address, admin_id, reason, now)
            .await?;
        info!(
            email = ?email,
            ip = ?ip_address,
            admin_id = %admin_id,
            cleared = cleared,
            "Login attempts unlocked"
        );
        Ok(cleared)
    }
}

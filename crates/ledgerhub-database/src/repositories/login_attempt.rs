//! Login attempt repository implementation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ledgerhub_core::error::{AppError, ErrorKind};
use ledgerhub_core::result::AppResult;
use ledgerhub_entity::login_attempt::{FailureSummary, NewLoginAttempt};

use crate::bypass::UnscopedDb;

/// Repository for the login attempt audit trail.
#[derive(Debug, Clone)]
pub struct LoginAttemptRepository {
    db: UnscopedDb,
}

impl LoginAttemptRepository {
    pub fn new(db: UnscopedDb) -> Self {
        Self { db }
    }

    pub async fn record(&self, attempt: &NewLoginAttempt) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO login_attempts (email, ip_address, success, failure_reason, attempted_at) \
             VALUES (LOWER($1), $2, $3, $4, $5)",
        )
        .bind(&attempt.email)
        .bind(&attempt.ip_address)
        .bind(attempt.success)
        .bind(attempt.failure_reason)
        .bind(attempt.attempted_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record login attempt", e))?;
        Ok(())
    }

    /// Uncleared failures for an email since `since`.
    pub async fn failures_by_email(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> AppResult<FailureSummary> {
        sqlx::query_as::<_, FailureSummary>(
            "SELECT COUNT(*) AS failure_count, MAX(attempted_at) AS last_failure_at \
             FROM login_attempts \
             WHERE email = LOWER($1) AND success = FALSE AND unlocked_at IS NULL \
             AND attempted_at >= $2",
        )
        .bind(email)
        .bind(since)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count failures by email", e))
    }

    /// Uncleared failures from an IP address since `since`.
    pub async fn failures_by_ip(&self, ip_address: &str, since: DateTime<Utc>) -> AppResult<FailureSummary> {
        sqlx::query_as::<_, FailureSummary>(
            "SELECT COUNT(*) AS failure_count, MAX(attempted_at) AS last_failure_at \
             FROM login_attempts \
             WHERE ip_address = $1 AND success = FALSE AND unlocked_at IS NULL \
             AND attempted_at >= $2",
        )
        .bind(ip_address)
        .bind(since)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count failures by IP", e))
    }

    /// Clear uncleared failures matching the email and/or IP.
    ///
    /// Rows are kept for audit; only the `unlocked_*` columns change.
    pub async fn unlock(
        &self,
        email: Option<&str>,
        ip_address: Option<&str>,
        unlocked_by: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        if email.is_none() && ip_address.is_none() {
            return Err(AppError::validation("Unlock requires an email or an IP address"));
        }
        let result = sqlx::query(
            "UPDATE login_attempts SET unlocked_at = $1, unlocked_by = $2, unlock_reason = $3 \
             WHERE success = FALSE AND unlocked_at IS NULL \
             AND (($4::TEXT IS NOT NULL AND email = LOWER($4)) OR ($5::TEXT IS NOT NULL AND ip_address = $5))",
        )
        .bind(now)
        .bind(unlocked_by)
        .bind(reason)
        .bind(email)
        .bind(ip_address)
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to unlock login attempts", e))?;
        Ok(result.rows_affected())
    }
}

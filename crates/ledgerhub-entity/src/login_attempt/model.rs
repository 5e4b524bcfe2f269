//! Login attempt entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Why a login attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "login_failure_reason", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// No identity with that email.
    UnknownEmail,
    /// Password did not match.
    InvalidPassword,
    /// Identity exists but is deactivated.
    AccountInactive,
}

/// One recorded login attempt. Rows are never deleted; admin unlock
/// soft-updates the `unlocked_*` columns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoginAttempt {
    /// Row ID.
    pub id: Uuid,
    /// Normalized (lowercase) email that was presented.
    pub email: String,
    /// Client IP address, when known.
    pub ip_address: Option<String>,
    /// Whether the credentials verified.
    pub success: bool,
    /// Failure reason for unsuccessful attempts.
    pub failure_reason: Option<FailureReason>,
    /// When the attempt happened.
    pub attempted_at: DateTime<Utc>,
    /// When an administrator cleared this failure.
    pub unlocked_at: Option<DateTime<Utc>>,
    /// Administrator who cleared it.
    pub unlocked_by: Option<Uuid>,
    /// Free-text reason for the unlock.
    pub unlock_reason: Option<String>,
}

/// Data required to record a login attempt.
#[derive(Debug, Clone)]
pub struct NewLoginAttempt {
    /// Normalized email.
    pub email: String,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Outcome.
    pub success: bool,
    /// Failure reason, `None` on success.
    pub failure_reason: Option<FailureReason>,
    /// Attempt time.
    pub attempted_at: DateTime<Utc>,
}

/// Aggregate of uncleared failures for one key inside a lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromRow)]
pub struct FailureSummary {
    /// Number of failures.
    pub failure_count: i64,
    /// Most recent failure.
    pub last_failure_at: Option<DateTime<Utc>>,
}

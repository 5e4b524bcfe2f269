//! Pure lockout tier evaluation.

use chrono::{DateTime, Duration, Utc};

use ledgerhub_core::config::{LockoutConfig, LockoutTierConfig};
use ledgerhub_core::error::AppError;

/// Lock state of one key (email or IP) or of a combined check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockStatus {
    /// Whether new attempts must be rejected.
    pub locked: bool,
    /// Highest tier reached (1-based); 0 when no threshold is met.
    pub tier: u8,
    /// Seconds until the lock lifts; 0 when unlocked.
    pub retry_after_seconds: u64,
    /// Failures counted inside the lookback window.
    pub failure_count: u32,
    /// When the lock lifts.
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockStatus {
    /// Combine the status of two keys: any lock wins, and between two locks
    /// the later unlock wins.
    pub fn most_restrictive(self, other: Self) -> Self {
        match (self.locked, other.locked) {
            (true, false) => self,
            (false, true) => other,
            (true, true) => {
                if other.locked_until > self.locked_until {
                    other
                } else {
                    self
                }
            }
            (false, false) => {
                if other.failure_count > self.failure_count {
                    other
                } else {
                    self
                }
            }
        }
    }

    /// The error returned to a client hitting this lock.
    pub fn to_error(&self) -> AppError {
        AppError::account_locked(self.tier, self.retry_after_seconds, self.failure_count)
    }
}

/// Ordered lockout tiers.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    tiers: Vec<LockoutTierConfig>,
}

impl LockoutPolicy {
    /// Build a policy from validated configuration.
    pub fn new(config: &LockoutConfig) -> Self {
        let mut tiers = config.tiers.clone();
        tiers.sort_by_key(|t| t.threshold);
        Self { tiers }
    }

    /// How far back failures are counted: the longest tier duration.
    pub fn lookback(&self) -> Duration {
        let seconds = self
            .tiers
            .iter()
            .map(|t| t.duration_seconds)
            .max()
            .unwrap_or(0);
        Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX))
    }

    /// Evaluate `failure_count` failures, the latest at `last_failure_at`.
    ///
    /// The highest tier whose threshold is met applies; its lock runs for
    /// the tier duration from the most recent failure.
    pub fn evaluate(
        &self,
        failure_count: u32,
        last_failure_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> LockStatus {
        let unlocked = LockStatus {
            failure_count,
            ..LockStatus::default()
        };
        let Some(index) = self.tiers.iter().rposition(|t| failure_count >= t.threshold) else {
            return unlocked;
        };
        let tier = u8::try_from(index + 1).unwrap_or(u8::MAX);
        let Some(last_failure_at) = last_failure_at else {
            return LockStatus { tier, ..unlocked };
        };

        let duration = i64::try_from(self.tiers[index].duration_seconds).unwrap_or(i64::MAX);
        let until = last_failure_at + Duration::seconds(duration);
        if until <= now {
            return LockStatus { tier, ..unlocked };
        }

        let remaining_ms = (until - now).num_milliseconds();
        let retry_after_seconds = u64::try_from((remaining_ms + 999) / 1000).unwrap_or(1).max(1);
        LockStatus {
            locked: true,
            tier,
            retry_after_seconds,
            failure_count,
            locked_until: Some(until),
        }
    }
}

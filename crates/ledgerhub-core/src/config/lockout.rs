//! Brute-force lockout configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const MAX_DURATION_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Escalating lockout tiers applied per email and per client IP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutConfig {
    /// Tiers ordered by strictly increasing threshold.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<LockoutTierConfig>,
}

/// A single lockout tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutTierConfig {
    /// Failure count at which this tier engages.
    pub threshold: u32,
    /// Lock duration measured from the most recent failure, in seconds.
    pub duration_seconds: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
        }
    }
}

impl LockoutConfig {
    pub(crate) fn validate(&self) -> Result<(), AppError> {
        if self.tiers.is_empty() {
            return Err(AppError::configuration("lockout.tiers must not be empty"));
        }
        if self.tiers.len() > usize::from(u8::MAX) {
            return Err(AppError::configuration("lockout.tiers has too many entries"));
        }
        for pair in self.tiers.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(AppError::configuration(
                    "lockout.tiers thresholds must be strictly increasing",
                ));
            }
            if pair[1].duration_seconds < pair[0].duration_seconds {
                return Err(AppError::configuration(
                    "lockout.tiers durations must not decrease",
                ));
            }
        }
        if self.tiers.iter().any(|t| t.threshold == 0 || t.duration_seconds == 0) {
            return Err(AppError::configuration(
                "lockout.tiers thresholds and durations must be positive",
            ));
        }
        if self.tiers.iter().any(|t| t.duration_seconds > MAX_DURATION_SECONDS) {
            return Err(AppError::configuration(
                "lockout.tiers durations must not exceed one year",
            ));
        }
        Ok(())
    }
}

fn default_tiers() -> Vec<LockoutTierConfig> {
    vec![
        LockoutTierConfig {
            threshold: 3,
            duration_seconds: 300,
        },
        LockoutTierConfig {
            threshold: 5,
            duration_seconds: 900,
        },
        LockoutTierConfig {
            threshold: 10,
            duration_seconds: 3_600,
        },
        LockoutTierConfig {
            threshold: 15,
            duration_seconds: 86_400,
        },
    ]
}

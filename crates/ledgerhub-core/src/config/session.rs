//! Refresh-token session configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Refresh-token session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of simultaneously active refresh tokens per identity.
    #[serde(default = "default_max_active")]
    pub max_active_refresh_tokens: usize,
    /// Days a revoked refresh token row is retained before deletion.
    #[serde(default = "default_retention")]
    pub revoked_retention_days: u64,
    /// Interval between maintenance sweeps in minutes.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_active_refresh_tokens: default_max_active(),
            revoked_retention_days: default_retention(),
            sweep_interval_minutes: default_sweep_interval(),
        }
    }
}

impl SessionConfig {
    pub(crate) fn validate(&self) -> Result<(), AppError> {
        if self.max_active_refresh_tokens == 0 {
            return Err(AppError::configuration(
                "session.max_active_refresh_tokens must be at least 1",
            ));
        }
        if self.sweep_interval_minutes == 0 {
            return Err(AppError::configuration(
                "session.sweep_interval_minutes must be positive",
            ));
        }
        Ok(())
    }
}

fn default_max_active() -> usize {
    2
}

fn default_retention() -> u64 {
    30
}

fn default_sweep_interval() -> u64 {
    15
}

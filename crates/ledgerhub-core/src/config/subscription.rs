//! Tenant lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Trial and grace period lengths used when provisioning tenants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Length of a new tenant's trial in days.
    #[serde(default = "default_trial_days")]
    pub trial_period_days: u64,
    /// Days a `PAST_DUE` tenant keeps access after a missed billing cycle.
    #[serde(default = "default_grace_days")]
    pub grace_period_days: u64,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            trial_period_days: default_trial_days(),
            grace_period_days: default_grace_days(),
        }
    }
}

fn default_trial_days() -> u64 {
    14
}

fn default_grace_days() -> u64 {
    7
}

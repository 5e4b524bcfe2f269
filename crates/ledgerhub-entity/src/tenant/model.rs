//! Tenant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::TenantStatus;

/// A subscribing customer organization and the top-level isolation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    /// Unique tenant identifier.
    pub id: Uuid,
    /// Organization name.
    pub name: String,
    /// Lifecycle status.
    pub status: TenantStatus,
    /// End of the trial period (set while in `TRIAL`).
    pub trial_ends_at: Option<DateTime<Utc>>,
    /// Current subscription record, if any.
    pub subscription_id: Option<Uuid>,
    /// When the tenant was created.
    pub created_at: DateTime<Utc>,
    /// When the tenant was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new tenant.
#[derive(Debug, Clone)]
pub struct CreateTenant {
    /// Organization name.
    pub name: String,
    /// Initial status.
    pub status: TenantStatus,
    /// End of the trial period.
    pub trial_ends_at: Option<DateTime<Utc>>,
}

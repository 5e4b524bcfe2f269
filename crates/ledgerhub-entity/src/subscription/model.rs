//! Subscription entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Billing state of a subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Expired,
    Cancelled,
}

/// A tenant's billing subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    /// Row ID.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Billing state.
    pub status: SubscriptionStatus,
    /// Start of the paid period.
    pub current_period_start: DateTime<Utc>,
    /// End of the paid period.
    pub current_period_end: DateTime<Utc>,
    /// End of the grace period once a cycle is missed.
    pub grace_period_ends_at: Option<DateTime<Utc>>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether the record itself has ended, regardless of tenant status.
    pub fn is_terminated(&self) -> bool {
        matches!(
            self.status,
            SubscriptionStatus::Expired | SubscriptionStatus::Cancelled
        )
    }
}

/// Data required to create a subscription record.
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Initial billing state.
    pub status: SubscriptionStatus,
    /// Start of the paid period.
    pub current_period_start: DateTime<Utc>,
    /// End of the paid period.
    pub current_period_end: DateTime<Utc>,
    /// Grace end, if already past due.
    pub grace_period_ends_at: Option<DateTime<Utc>>,
}

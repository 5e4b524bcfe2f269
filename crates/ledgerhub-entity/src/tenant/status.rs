//! Tenant lifecycle status and transitions.

use std::fmt;

use ledgerhub_core::AppError;
use serde::{Deserialize, Serialize};

/// Subscription lifecycle state of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tenant_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantStatus {
    /// Evaluating the product until the trial end date.
    Trial,
    /// Paid and current.
    Active,
    /// A billing cycle was missed; access continues during the grace period.
    PastDue,
    /// Grace period elapsed without payment.
    Suspended,
    /// Trial elapsed without conversion.
    Expired,
    /// Terminally cancelled.
    Cancelled,
}

/// Event that drives a tenant lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A payment cleared.
    PaymentSucceeded,
    /// The trial end date passed.
    TrialElapsed,
    /// The subscription period ended without payment.
    BillingCycleMissed,
    /// The grace period ended without payment.
    GracePeriodElapsed,
    /// The tenant cancelled.
    Cancelled,
}

impl TenantStatus {
    /// Apply a lifecycle event, returning the next status.
    ///
    /// `CANCELLED` is terminal. Any other undefined pair is rejected.
    pub fn apply(self, event: LifecycleEvent) -> Result<Self, AppError> {
        use LifecycleEvent as E;

        match (self, event) {
            (Self::Cancelled, _) => Err(AppError::validation(
                "Tenant is cancelled; no further lifecycle transitions are allowed",
            )),
            (_, E::Cancelled) => Ok(Self::Cancelled),
            (Self::Trial, E::PaymentSucceeded) => Ok(Self::Active),
            (Self::Trial, E::TrialElapsed) => Ok(Self::Expired),
            (Self::Active, E::PaymentSucceeded) => Ok(Self::Active),
            (Self::Active, E::BillingCycleMissed) => Ok(Self::PastDue),
            (Self::PastDue, E::PaymentSucceeded) => Ok(Self::Active),
            (Self::PastDue, E::GracePeriodElapsed) => Ok(Self::Suspended),
            (from, event) => Err(AppError::validation(format!(
                "Invalid lifecycle transition: {from} on {event:?}"
            ))),
        }
    }

    /// Return the status as its database string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "TRIAL",
            Self::Active => "ACTIVE",
            Self::PastDue => "PAST_DUE",
            Self::Suspended => "SUSPENDED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

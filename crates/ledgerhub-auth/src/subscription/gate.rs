//! Per-request subscription gate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use ledgerhub_core::error::{AppError, SubscriptionCode};
use ledgerhub_core::result::AppResult;
use ledgerhub_database::repositories::{SubscriptionRepository, TenantRepository};
use ledgerhub_entity::subscription::Subscription;
use ledgerhub_entity::tenant::{Tenant, TenantStatus};

/// A tenant that may proceed, possibly with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GateOutcome {
    /// No restriction.
    Allowed,
    /// Past due but still inside the grace period.
    PaymentOverdue { grace_ends_at: DateTime<Utc> },
}

impl GateOutcome {
    /// Value of the warning signal sent to clients, if any.
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            Self::Allowed => None,
            Self::PaymentOverdue { .. } => Some("payment-overdue"),
        }
    }
}

/// Decide whether `tenant` may be accessed at `now`.
pub fn evaluate(
    tenant: &Tenant,
    subscription: Option<&Subscription>,
    now: DateTime<Utc>,
) -> Result<GateOutcome, SubscriptionCode> {
    match tenant.status {
        TenantStatus::Trial => match tenant.trial_ends_at {
            Some(ends_at) if ends_at > now => Ok(GateOutcome::Allowed),
            _ => Err(SubscriptionCode::TrialExpired),
        },
        TenantStatus::Active => match subscription {
            Some(s) if s.is_terminated() => Err(SubscriptionCode::SubscriptionExpired),
            _ => Ok(GateOutcome::Allowed),
        },
        TenantStatus::PastDue => match subscription.and_then(|s| s.grace_period_ends_at) {
            Some(grace_ends_at) if grace_ends_at > now => {
                Ok(GateOutcome::PaymentOverdue { grace_ends_at })
            }
            _ => Err(SubscriptionCode::PaymentOverdue),
        },
        TenantStatus::Suspended => Err(SubscriptionCode::Suspended),
        TenantStatus::Expired => Err(SubscriptionCode::Expired),
        TenantStatus::Cancelled => Err(SubscriptionCode::Cancelled),
    }
}

fn block_message(code: SubscriptionCode) -> &'static str {
    match code {
        SubscriptionCode::TrialExpired => "The trial period has ended",
        SubscriptionCode::PaymentOverdue => "Payment is overdue and the grace period has ended",
        SubscriptionCode::Suspended => "The tenant is suspended",
        SubscriptionCode::Expired => "The tenant subscription has expired",
        SubscriptionCode::Cancelled => "The tenant has been cancelled",
        SubscriptionCode::SubscriptionExpired => "The tenant subscription is no longer active",
    }
}

/// Loads tenant and subscription state and applies [`evaluate`].
#[derive(Debug, Clone)]
pub struct SubscriptionGate {
    tenants: Arc<TenantRepository>,
    subscriptions: Arc<SubscriptionRepository>,
}

impl SubscriptionGate {
    pub fn new(tenants: Arc<TenantRepository>, subscriptions: Arc<SubscriptionRepository>) -> Self {
        Self {
            tenants,
            subscriptions,
        }
    }

    /// Check the tenant's current status. Blocks become
    /// [`ErrorKind::Subscription`](ledgerhub_core::ErrorKind::Subscription)
    /// errors carrying the reason code.
    pub async fn check(&self, tenant_id: Uuid, now: DateTime<Utc>) -> AppResult<GateOutcome> {
        let tenant = self
            .tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::authorization("Tenant not found"))?;
        let subscription = self.subscriptions.find_for_tenant(&tenant).await?;

        evaluate(&tenant, subscription.as_ref(), now).map_err(|code| {
            warn!(tenant_id = %tenant_id, status = %tenant.status, code = %code, "Subscription gate blocked tenant");
            AppError::subscription(code, block_message(code))
        })
    }
}

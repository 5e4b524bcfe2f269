//! Tenant subscription enforcement and lifecycle changes.

pub mod gate;
pub mod lifecycle;

pub use gate::{GateOutcome, SubscriptionGate, evaluate};
pub use lifecycle::{ProvisionTenant, TenantLifecycle};

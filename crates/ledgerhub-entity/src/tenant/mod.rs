//! Tenant entities and the subscription lifecycle state machine.

pub mod model;
pub mod status;

pub use model::{CreateTenant, Tenant};
pub use status::{LifecycleEvent, TenantStatus};

//! Global identity entities.

pub mod model;

pub use model::{CreateIdentity, Identity, IdentitySummary};

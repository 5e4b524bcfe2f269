//! Role-based permission checks.

pub mod policies;

pub use policies::{Permission, RbacPolicies};

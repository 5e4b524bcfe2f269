//! Two-tier tenant and company access resolution.

pub mod resolver;

pub use resolver::{AccessResolver, ResolvedAccess, TenantGrant};

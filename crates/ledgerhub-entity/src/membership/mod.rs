//! Two-tier access entities: tenant memberships and company role grants.

pub mod model;
pub mod role;

pub use model::{CompanyAccess, CompanyGrantRow, TenantMembership};
pub use role::{CompanyRole, MembershipTier, Role, TenantRole};

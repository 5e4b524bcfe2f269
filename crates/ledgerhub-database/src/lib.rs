//! # ledgerhub-database
//!
//! PostgreSQL connection management, the tenant scope enforcer and the
//! repositories for the non-tenant tables of the auth core.
//!
//! Application code obtains database access in exactly two ways:
//!
//! - [`Database::scoped`] returns a [`TenantDb`] whose every statement is
//!   filtered by tenant (and company, when the table is company-scoped).
//! - [`Database::unscoped`] returns an [`UnscopedDb`] tagged with a
//!   [`BypassPurpose`]. Repositories for identities, tenants, memberships,
//!   refresh tokens, login attempts and subscriptions can only be built
//!   from such a handle.

pub mod bypass;
pub mod connection;
pub mod migration;
pub mod repositories;
pub mod scope;
pub mod transaction;

pub use bypass::{BypassPurpose, UnscopedDb};
pub use connection::Database;
pub use scope::{Filter, TenantDb, TenantScope, TenantTable, Value};
pub use transaction::UnitOfWork;

//! Tenant scope enforcement.
//!
//! A [`TenantDb`] is bound to a [`TenantScope`] when it is created and
//! prepends the scope predicate to every statement it builds. Callers
//! supply additional conditions through [`Filter`] but can never name the
//! scope columns themselves, so a query built through this handle cannot
//! observe or modify another tenant's rows.

mod filter;
mod handle;
mod table;

pub use filter::{Filter, Op, Value};
pub use handle::{TenantDb, TenantScope};
pub use table::TenantTable;

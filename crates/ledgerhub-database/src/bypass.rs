//! Purpose-tagged access that bypasses tenant scoping.

use std::fmt;

use ledgerhub_core::AppResult;
use sqlx::PgPool;
use tracing::debug;

use crate::transaction::UnitOfWork;

/// Why a caller needs to read or write outside any single tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BypassPurpose {
    /// Login, refresh and password change: identities, tokens, attempts.
    CredentialLookup,
    /// Resolving memberships and company grants across tenants.
    AccessResolution,
    /// Reading tenant status and subscription records.
    SubscriptionCheck,
    /// Background sweeps and administrator operations.
    Maintenance,
}

impl BypassPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CredentialLookup => "credential_lookup",
            Self::AccessResolution => "access_resolution",
            Self::SubscriptionCheck => "subscription_check",
            Self::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for BypassPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database handle without a tenant filter.
///
/// Only the repositories in this crate can run statements through it.
#[derive(Debug, Clone)]
pub struct UnscopedDb {
    pool: PgPool,
    purpose: BypassPurpose,
}

impl UnscopedDb {
    pub(crate) fn new(pool: PgPool, purpose: BypassPurpose) -> Self {
        debug!(purpose = %purpose, "Issued unscoped database handle");
        Self { pool, purpose }
    }

    /// The purpose this handle was issued for.
    pub fn purpose(&self) -> BypassPurpose {
        self.purpose
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Open a transaction for a multi-statement operation.
    pub async fn begin(&self) -> AppResult<UnitOfWork> {
        UnitOfWork::begin(&self.pool, self.purpose).await
    }
}

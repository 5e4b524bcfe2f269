//! Company entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A legal entity inside a tenant. Business records are scoped to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Company {
    /// Unique company identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Company name.
    pub name: String,
    /// Inactive companies are excluded from access lists.
    pub is_active: bool,
    /// When the company was created.
    pub created_at: DateTime<Utc>,
}

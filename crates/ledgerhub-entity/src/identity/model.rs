//! Identity entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A person who can log in. Identities are global and belong to no tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Identity {
    /// Unique identity identifier.
    pub id: Uuid,
    /// Login email, unique case-insensitively.
    pub email: String,
    /// Argon2id password hash in PHC format.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Inactive identities cannot log in or refresh.
    pub is_active: bool,
    /// Platform operator flag; unrelated to tenant roles.
    pub is_system_admin: bool,
    /// When the password was last changed.
    pub password_changed_at: Option<DateTime<Utc>>,
    /// When the identity was created.
    pub created_at: DateTime<Utc>,
    /// When the identity was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Public projection without credential material.
    pub fn summary(&self) -> IdentitySummary {
        IdentitySummary {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Public projection of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    /// Identity ID.
    pub id: Uuid,
    /// Login email.
    pub email: String,
    /// Display name.
    pub display_name: Option<String>,
}

/// Data required to create a new identity.
#[derive(Debug, Clone)]
pub struct CreateIdentity {
    /// Login email.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Display name (optional).
    pub display_name: Option<String>,
    /// Platform operator flag.
    pub is_system_admin: bool,
}

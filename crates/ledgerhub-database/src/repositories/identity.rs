//! Identity repository implementation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ledgerhub_core::error::{AppError, ErrorKind};
use ledgerhub_core::result::AppResult;
use ledgerhub_entity::identity::{CreateIdentity, Identity};

use crate::bypass::UnscopedDb;
use crate::transaction::UnitOfWork;

/// Repository for global identities.
#[derive(Debug, Clone)]
pub struct IdentityRepository {
    db: UnscopedDb,
}

impl IdentityRepository {
    pub fn new(db: UnscopedDb) -> Self {
        Self { db }
    }

    /// Find an identity by email, case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>> {
        sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find identity by email", e))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Identity>> {
        sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find identity", e))
    }

    /// Lock the identity row for the rest of the transaction.
    ///
    /// Session mutations of one identity take this lock first, so they
    /// serialize without lock-order deadlocks on the token rows.
    pub async fn lock_by_id(&self, uow: &mut UnitOfWork, id: Uuid) -> AppResult<Option<Identity>> {
        sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(uow.conn()?)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to lock identity", e))
    }

    /// Create a new identity. Duplicate emails are a conflict.
    pub async fn create(&self, data: &CreateIdentity) -> AppResult<Identity> {
        sqlx::query_as::<_, Identity>(
            "INSERT INTO identities (email, password_hash, display_name, is_system_admin) \
             VALUES (LOWER($1), $2, $3, $4) RETURNING *",
        )
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.display_name)
        .bind(data.is_system_admin)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| AppError::from_sqlx("Failed to create identity", e))
    }

    /// Replace the password hash inside the caller's transaction.
    pub async fn update_password_hash(
        &self,
        uow: &mut UnitOfWork,
        id: Uuid,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE identities SET password_hash = $1, password_changed_at = $2, updated_at = $2 \
             WHERE id = $3",
        )
        .bind(password_hash)
        .bind(now)
        .bind(id)
        .execute(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to update password", e))?;
        Ok(())
    }

    /// Activate or deactivate an identity. Identities are never deleted.
    pub async fn set_active(&self, id: Uuid, active: bool) -> AppResult<()> {
        sqlx::query("UPDATE identities SET is_active = $1, updated_at = NOW() WHERE id = $2")
            .bind(active)
            .bind(id)
            .execute(self.db.pool())
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update identity status", e))?;
        Ok(())
    }
}

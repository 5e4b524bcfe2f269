//! Refresh token repository implementation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ledgerhub_core::error::{AppError, ErrorKind};
use ledgerhub_core::result::AppResult;
use ledgerhub_entity::session::{NewRefreshToken, RefreshToken, RevocationReason};

use crate::bypass::UnscopedDb;
use crate::transaction::UnitOfWork;

/// Repository for hashed refresh tokens.
#[derive(Debug, Clone)]
pub struct RefreshTokenRepository {
    db: UnscopedDb,
}

impl RefreshTokenRepository {
    pub fn new(db: UnscopedDb) -> Self {
        Self { db }
    }

    /// Find an unrevoked, unexpired token by hash without locking.
    pub async fn find_active_by_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<RefreshToken>> {
        sqlx::query_as::<_, RefreshToken>(
            "SELECT * FROM refresh_tokens WHERE token_hash = $1 AND revoked = FALSE AND expires_at > $2",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find refresh token", e))
    }

    /// Lock the unrevoked row with this hash for the rest of the transaction.
    ///
    /// A concurrent holder makes this wait; once it commits the row reads
    /// as revoked and `None` is returned.
    pub async fn lock_unrevoked_by_hash(
        &self,
        uow: &mut UnitOfWork,
        token_hash: &str,
    ) -> AppResult<Option<RefreshToken>> {
        sqlx::query_as::<_, RefreshToken>(
            "SELECT * FROM refresh_tokens WHERE token_hash = $1 AND revoked = FALSE FOR UPDATE",
        )
        .bind(token_hash)
        .fetch_optional(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to lock refresh token", e))
    }

    /// Lock the identity's unrevoked, unexpired tokens, newest first.
    pub async fn lock_active_for_identity(
        &self,
        uow: &mut UnitOfWork,
        identity_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RefreshToken>> {
        sqlx::query_as::<_, RefreshToken>(
            "SELECT * FROM refresh_tokens \
             WHERE identity_id = $1 AND revoked = FALSE AND expires_at > $2 \
             ORDER BY created_at DESC, id DESC FOR UPDATE",
        )
        .bind(identity_id)
        .bind(now)
        .fetch_all(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to lock active refresh tokens", e))
    }

    pub async fn insert(&self, uow: &mut UnitOfWork, data: &NewRefreshToken) -> AppResult<RefreshToken> {
        sqlx::query_as::<_, RefreshToken>(
            "INSERT INTO refresh_tokens \
             (id, identity_id, tenant_id, company_id, token_hash, device_name, ip_address, user_agent, \
              expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(data.id)
        .bind(data.identity_id)
        .bind(data.tenant_id)
        .bind(data.company_id)
        .bind(&data.token_hash)
        .bind(&data.device_name)
        .bind(&data.ip_address)
        .bind(&data.user_agent)
        .bind(data.expires_at)
        .bind(data.created_at)
        .fetch_one(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to store refresh token", e))
    }

    /// Revoke the listed tokens inside the caller's transaction.
    pub async fn revoke_many(
        &self,
        uow: &mut UnitOfWork,
        ids: &[Uuid],
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE, revoked_at = $1, revoked_reason = $2 \
             WHERE id = ANY($3) AND revoked = FALSE",
        )
        .bind(now)
        .bind(reason.as_str())
        .bind(ids)
        .execute(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to revoke refresh tokens", e))?;
        Ok(result.rows_affected())
    }

    /// Revoke the identity's tokens whose expiry has passed.
    pub async fn revoke_expired_for_identity(
        &self,
        uow: &mut UnitOfWork,
        identity_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE, revoked_at = $1, revoked_reason = $2 \
             WHERE identity_id = $3 AND revoked = FALSE AND expires_at <= $1",
        )
        .bind(now)
        .bind(RevocationReason::Expired.as_str())
        .bind(identity_id)
        .execute(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to revoke expired refresh tokens", e))?;
        Ok(result.rows_affected())
    }

    /// Revoke every unrevoked token of an identity.
    pub async fn revoke_all_for_identity(
        &self,
        uow: &mut UnitOfWork,
        identity_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE, revoked_at = $1, revoked_reason = $2 \
             WHERE identity_id = $3 AND revoked = FALSE",
        )
        .bind(now)
        .bind(reason.as_str())
        .bind(identity_id)
        .execute(uow.conn()?)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to revoke refresh tokens", e))?;
        Ok(result.rows_affected())
    }

    /// Revoke one token by hash. Unknown or already revoked hashes are a no-op.
    pub async fn revoke_by_hash(
        &self,
        token_hash: &str,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE, revoked_at = $1, revoked_reason = $2 \
             WHERE token_hash = $3 AND revoked = FALSE",
        )
        .bind(now)
        .bind(reason.as_str())
        .bind(token_hash)
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::from_sqlx("Failed to revoke refresh token", e))?;
        Ok(result.rows_affected())
    }

    /// Move an unrevoked session to another tenant or company.
    ///
    /// Returns false when the session no longer exists or was revoked.
    pub async fn update_context(
        &self,
        id: Uuid,
        tenant_id: Uuid,
        company_id: Option<Uuid>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET tenant_id = $1, company_id = $2 WHERE id = $3 AND revoked = FALSE",
        )
        .bind(tenant_id)
        .bind(company_id)
        .bind(id)
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::from_sqlx("Failed to update session context", e))?;
        Ok(result.rows_affected() == 1)
    }

    /// Revoke every token whose expiry has passed.
    pub async fn revoke_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE, revoked_at = $1, revoked_reason = $2 \
             WHERE revoked = FALSE AND expires_at <= $1",
        )
        .bind(now)
        .bind(RevocationReason::Expired.as_str())
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke expired tokens", e))?;
        Ok(result.rows_affected())
    }

    /// Delete revoked rows older than `cutoff`.
    pub async fn delete_revoked_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE revoked = TRUE AND revoked_at < $1")
            .bind(cutoff)
            .execute(self.db.pool())
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to purge revoked tokens", e))?;
        Ok(result.rows_affected())
    }
}

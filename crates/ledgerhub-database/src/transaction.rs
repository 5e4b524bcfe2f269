//! Explicit transactions for multi-statement operations.

use ledgerhub_core::{AppError, AppResult};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::debug;

use crate::bypass::BypassPurpose;

/// A database transaction that rolls back unless committed.
///
/// Repositories accept `&mut UnitOfWork` for statements that must share
/// the transaction, such as the row lock taken during refresh rotation.
pub struct UnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
    purpose: BypassPurpose,
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("purpose", &self.purpose)
            .field("open", &self.tx.is_some())
            .finish()
    }
}

impl UnitOfWork {
    pub(crate) async fn begin(pool: &PgPool, purpose: BypassPurpose) -> AppResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| AppError::from_sqlx("Failed to begin transaction", e))?;
        debug!(purpose = %purpose, "Transaction started");
        Ok(Self {
            tx: Some(tx),
            purpose,
        })
    }

    pub(crate) fn conn(&mut self) -> AppResult<&mut PgConnection> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(AppError::internal("Transaction already finished")),
        }
    }

    /// Commit all statements.
    pub async fn commit(mut self) -> AppResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit()
                .await
                .map_err(|e| AppError::from_sqlx("Failed to commit transaction", e))?;
            debug!(purpose = %self.purpose, "Transaction committed");
        }
        Ok(())
    }

    /// Discard all statements.
    pub async fn rollback(mut self) -> AppResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback()
                .await
                .map_err(|e| AppError::from_sqlx("Failed to roll back transaction", e))?;
            debug!(purpose = %self.purpose, "Transaction rolled back");
        }
        Ok(())
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if self.tx.is_some() {
            // sqlx rolls the transaction back when it is dropped.
            debug!(purpose = %self.purpose, "Transaction dropped without commit, rolling back");
        }
    }
}

//! Convenience result type alias for LedgerHub.

use crate::error::AppError;

/// A specialized `Result` type for LedgerHub operations.
pub type AppResult<T> = Result<T, AppError>;

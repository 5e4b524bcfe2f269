//! # ledgerhub-core
//!
//! Core crate for LedgerHub. Contains configuration schemas and the
//! unified error system shared by every other crate.
//!
//! This crate has **no** internal dependencies on other LedgerHub crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorDetail, ErrorKind, SubscriptionCode};
pub use result::AppResult;

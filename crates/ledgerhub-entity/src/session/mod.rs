//! Refresh-token session entities.

pub mod model;

pub use model::{NewRefreshToken, RefreshToken, RevocationReason};

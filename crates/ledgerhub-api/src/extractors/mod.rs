//! Custom Axum extractors.

pub mod auth;
pub mod client;
pub mod scoped;

pub use auth::AuthUser;
pub use client::ClientMeta;
pub use scoped::ScopedDb;

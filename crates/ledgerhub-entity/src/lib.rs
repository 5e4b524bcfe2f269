//! # ledgerhub-entity
//!
//! Domain entity models for LedgerHub. Every struct in this crate
//! represents a database table row or a domain value object. Row types
//! derive `sqlx::FromRow`; Postgres enum columns map to enums deriving
//! `sqlx::Type`.

pub mod company;
pub mod identity;
pub mod login_attempt;
pub mod membership;
pub mod session;
pub mod subscription;
pub mod tenant;

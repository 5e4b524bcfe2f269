//! Brute-force protection with escalating lockout tiers.

pub mod guard;
pub mod policy;

pub use guard::{AttemptOutcome, BruteForceGuard};
pub use policy::{LockStatus, LockoutPolicy};

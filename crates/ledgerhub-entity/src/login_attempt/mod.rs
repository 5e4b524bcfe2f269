//! Login attempt audit entities.

pub mod model;

pub use model::{FailureReason, FailureSummary, LoginAttempt, NewLoginAttempt};

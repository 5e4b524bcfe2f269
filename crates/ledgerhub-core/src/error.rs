//! Unified application error types for LedgerHub.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Lockout and subscription failures
//! carry a structured [`ErrorDetail`] so the HTTP layer can render
//! `Retry-After` and machine-readable codes without string parsing.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Authentication failed (invalid credentials, expired or revoked token).
    Authentication,
    /// Credentials are temporarily locked by the brute-force guard.
    AccountLocked,
    /// The caller does not have permission to perform the action.
    Authorization,
    /// The tenant's subscription state blocks the request.
    Subscription,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate entry, concurrent modification, etc.).
    Conflict,
    /// An internal server error occurred.
    Internal,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::AccountLocked => write!(f, "ACCOUNT_LOCKED"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Subscription => write!(f, "SUBSCRIPTION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
        }
    }
}

/// Machine-readable reason a tenant's subscription blocks access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionCode {
    /// The trial period has elapsed.
    TrialExpired,
    /// Payment is overdue and the grace period has elapsed.
    PaymentOverdue,
    /// The tenant has been suspended.
    Suspended,
    /// The tenant has expired.
    Expired,
    /// The tenant has been cancelled.
    Cancelled,
    /// The tenant is active but its subscription record is terminated.
    SubscriptionExpired,
}

impl SubscriptionCode {
    /// Return the wire code used in API error bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrialExpired => "TRIAL_EXPIRED",
            Self::PaymentOverdue => "PAYMENT_OVERDUE",
            Self::Suspended => "SUSPENDED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
            Self::SubscriptionExpired => "SUBSCRIPTION_EXPIRED",
        }
    }
}

impl fmt::Display for SubscriptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured payload attached to errors that need more than a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorDetail {
    /// The brute-force guard has locked the credentials.
    Lockout {
        /// Lockout tier (1-based).
        tier: u8,
        /// Seconds until the lock expires.
        retry_after_seconds: u64,
        /// Failures counted inside the lookback window.
        failure_count: u32,
    },
    /// The subscription gate blocked the request.
    Subscription {
        /// Reason code.
        code: SubscriptionCode,
    },
}

/// The unified application error used throughout LedgerHub.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional structured detail.
    pub detail: Option<ErrorDetail>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
            source: Some(Box::new(source)),
        }
    }

    /// Classify a sqlx error, keeping `context` as the message.
    ///
    /// Lock contention, serialization failures and deadlocks become
    /// [`ErrorKind::Conflict`]; unique violations also map to `Conflict`.
    pub fn from_sqlx(context: impl Into<String>, err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("55P03" | "40001" | "40P01" | "23505") => ErrorKind::Conflict,
                _ => ErrorKind::Database,
            },
            sqlx::Error::RowNotFound => ErrorKind::NotFound,
            _ => ErrorKind::Database,
        };
        Self::with_source(kind, context, err)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create an account-locked error carrying the lockout detail.
    pub fn account_locked(tier: u8, retry_after_seconds: u64, failure_count: u32) -> Self {
        Self {
            kind: ErrorKind::AccountLocked,
            message: format!("Too many failed login attempts; retry in {retry_after_seconds} seconds"),
            detail: Some(ErrorDetail::Lockout {
                tier,
                retry_after_seconds,
                failure_count,
            }),
            source: None,
        }
    }

    /// Create an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Create a subscription error with its reason code.
    pub fn subscription(code: SubscriptionCode, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Subscription,
            message: message.into(),
            detail: Some(ErrorDetail::Subscription { code }),
            source: None,
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Whether the same request may succeed later without any change.
    ///
    /// Lockouts expire on their own; authorization and subscription
    /// failures do not.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::AccountLocked | ErrorKind::Conflict)
    }

    /// Return the subscription code if this is a subscription error.
    pub fn subscription_code(&self) -> Option<SubscriptionCode> {
        match self.detail {
            Some(ErrorDetail::Subscription { code }) => Some(code),
            _ => None,
        }
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            detail: self.detail.clone(),
            source: None,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let message = format!("Database error: {err}");
        Self::from_sqlx(message, err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

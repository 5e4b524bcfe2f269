//! Refresh token entity model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored refresh token. Only the SHA-256 hash of the opaque value is kept.
///
/// The row also anchors the session context (tenant and active company)
/// that a refresh re-mints access tokens for.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    /// Row ID; embedded as `sid` in access tokens minted from this session.
    pub id: Uuid,
    /// Owning identity.
    pub identity_id: Uuid,
    /// Tenant the session is currently acting in.
    pub tenant_id: Uuid,
    /// Active company, if one is selected.
    pub company_id: Option<Uuid>,
    /// Hex-encoded SHA-256 of the opaque token.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Client-supplied device label.
    pub device_name: Option<String>,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Whether the token has been revoked.
    pub revoked: bool,
    /// When the token was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Why the token was revoked.
    pub revoked_reason: Option<String>,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Whether the token has passed its absolute expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Data required to store a new refresh token.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    /// Pre-generated row ID so access tokens can reference it before insert.
    pub id: Uuid,
    /// Owning identity.
    pub identity_id: Uuid,
    /// Session tenant.
    pub tenant_id: Uuid,
    /// Session company.
    pub company_id: Option<Uuid>,
    /// Hex-encoded SHA-256 of the opaque token.
    pub token_hash: String,
    /// Client-supplied device label.
    pub device_name: Option<String>,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// Issue time.
    pub created_at: DateTime<Utc>,
}

/// Why a refresh token was revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// Replaced by a successor during refresh.
    Rotated,
    /// Evicted to respect the active-token cap.
    CapExceeded,
    /// Explicit logout.
    Logout,
    /// The identity changed its password.
    PasswordChanged,
    /// Swept after its expiry passed.
    Expired,
}

impl RevocationReason {
    /// Return the reason as stored in `revoked_reason`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rotated => "rotated",
            Self::CapExceeded => "cap_exceeded",
            Self::Logout => "logout",
            Self::PasswordChanged => "password_changed",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

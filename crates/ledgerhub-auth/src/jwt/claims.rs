//! JWT claims structure used in access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerhub_entity::membership::{CompanyAccess, Role};

/// JWT claims payload embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the identity ID.
    pub sub: Uuid,
    /// Identity email.
    pub email: String,
    /// Active tenant.
    pub tid: Uuid,
    /// Tenant-level role in the active tenant.
    pub role: Role,
    /// Active company, if one is selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<Uuid>,
    /// Accessible companies in the active tenant.
    #[serde(default)]
    pub companies: Vec<CompanyAccess>,
    /// Refresh-token session this token was minted from.
    pub sid: Uuid,
    /// Issuer.
    pub iss: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token ID.
    pub jti: Uuid,
}

impl AccessClaims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Everything an access token asserts about its bearer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessSubject {
    pub identity_id: Uuid,
    pub email: String,
    pub tenant_id: Uuid,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub companies: Vec<CompanyAccess>,
    pub session_id: Uuid,
}

//! Authentication configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Token signing and password policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Value of the `iss` claim on minted access tokens.
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: u64,
    /// Refresh token TTL in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_days: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Leeway applied to `exp` validation, in seconds.
    #[serde(default = "default_leeway")]
    pub clock_skew_leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_issuer: default_issuer(),
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_days: default_refresh_ttl(),
            password_min_length: default_password_min(),
            clock_skew_leeway_seconds: default_leeway(),
        }
    }
}

impl AuthConfig {
    /// Minimum accepted length of the signing secret in bytes.
    pub const MIN_SECRET_LENGTH: usize = 32;

    pub(crate) fn validate(&self) -> Result<(), AppError> {
        if self.jwt_secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be at least {} bytes",
                Self::MIN_SECRET_LENGTH
            )));
        }
        if self.access_token_ttl_minutes == 0 || self.refresh_token_ttl_days == 0 {
            return Err(AppError::configuration("auth token lifetimes must be positive"));
        }
        if self.access_token_ttl_minutes >= self.refresh_token_ttl_days * 24 * 60 {
            return Err(AppError::configuration(
                "auth.access_token_ttl_minutes must be shorter than the refresh token lifetime",
            ));
        }
        Ok(())
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_issuer() -> String {
    "ledgerhub".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    30
}

fn default_password_min() -> usize {
    10
}

fn default_leeway() -> u64 {
    5
}

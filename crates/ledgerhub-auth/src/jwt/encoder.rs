//! JWT access token creation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use uuid::Uuid;

use ledgerhub_core::config::AuthConfig;
use ledgerhub_core::error::AppError;

use super::claims::{AccessClaims, AccessSubject};

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct MintedAccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub jti: Uuid,
}

/// Signs access tokens with HS256.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// `iss` claim value.
    issuer: String,
    /// Access token lifetime.
    access_ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            access_ttl: Duration::minutes(
                i64::try_from(config.access_token_ttl_minutes).unwrap_or(i64::MAX / 60_000),
            ),
        }
    }

    /// Sign an access token for `subject`, issued at `now`.
    pub fn mint(&self, subject: &AccessSubject, now: DateTime<Utc>) -> Result<MintedAccessToken, AppError> {
        let expires_at = now + self.access_ttl;
        let jti = Uuid::new_v4();

        let claims = AccessClaims {
            sub: subject.identity_id,
            email: subject.email.clone(),
            tid: subject.tenant_id,
            role: subject.role,
            cid: subject.company_id,
            companies: subject.companies.clone(),
            sid: subject.session_id,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;

        Ok(MintedAccessToken {
            token,
            expires_at,
            jti,
        })
    }
}

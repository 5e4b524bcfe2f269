//! Token issuance and validation.
//!
//! Access tokens are stateless HS256 JWTs. Refresh tokens are opaque random
//! strings; only their SHA-256 hash is stored, so a leaked table cannot be
//! replayed.

pub mod refresh;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use ledgerhub_core::config::AuthConfig;
use ledgerhub_core::error::AppError;
use ledgerhub_core::result::AppResult;
use ledgerhub_database::repositories::RefreshTokenRepository;
use ledgerhub_entity::session::RefreshToken;

use crate::jwt::{AccessClaims, AccessSubject, JwtDecoder, JwtEncoder, MintedAccessToken};

pub use refresh::{generate_refresh_token, hash_refresh_token};

/// A freshly generated refresh token.
#[derive(Debug, Clone)]
pub struct MintedRefreshToken {
    /// Opaque value handed to the client exactly once.
    pub token: String,
    /// Stored hash.
    pub token_hash: String,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}

/// Mints and validates access and refresh tokens.
#[derive(Debug, Clone)]
pub struct TokenService {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    refresh_tokens: Arc<RefreshTokenRepository>,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig, refresh_tokens: Arc<RefreshTokenRepository>) -> Self {
        Self {
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
            refresh_tokens,
            refresh_ttl: Duration::days(
                i64::try_from(config.refresh_token_ttl_days)
                    .unwrap_or(36_500)
                    .min(36_500),
            ),
        }
    }

    pub fn mint_access_token(
        &self,
        subject: &AccessSubject,
        now: DateTime<Utc>,
    ) -> AppResult<MintedAccessToken> {
        self.encoder.mint(subject, now)
    }

    /// Generate a refresh token expiring one refresh TTL after `now`.
    pub fn mint_refresh_token(&self, now: DateTime<Utc>) -> MintedRefreshToken {
        let token = generate_refresh_token();
        let token_hash = hash_refresh_token(&token);
        MintedRefreshToken {
            token,
            token_hash,
            expires_at: now + self.refresh_ttl,
        }
    }

    /// Verify an access token and return its claims.
    pub fn validate_access_token(&self, token: &str) -> AppResult<AccessClaims> {
        self.decoder.decode(token)
    }

    /// Look up an unrevoked, unexpired refresh token without locking it.
    pub async fn validate_refresh_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<RefreshToken> {
        let hash = hash_refresh_token(token);
        match self.refresh_tokens.find_active_by_hash(&hash, now).await? {
            Some(row) => Ok(row),
            None => {
                debug!("Refresh token not found, revoked or expired");
                Err(AppError::authentication("Refresh token not found or revoked"))
            }
        }
    }
}

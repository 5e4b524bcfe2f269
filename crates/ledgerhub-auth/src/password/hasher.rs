//! Argon2id password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use tracing::{error, warn};

use ledgerhub_core::error::AppError;

/// Verifies presented passwords against stored Argon2id hashes.
///
/// Every mismatch, including a stored hash that does not parse, reads as
/// `Ok(false)`. Only failures inside the hashing library are errors.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    /// Hash verified against when no identity exists, so unknown emails
    /// cost the same as wrong passwords.
    dummy_hash: Option<String>,
}

impl PasswordHasher {
    /// Creates a new password hasher instance.
    pub fn new() -> Self {
        let dummy_hash = match hash_with_random_salt("ledgerhub-unknown-identity") {
            Ok(hash) => Some(hash),
            Err(e) => {
                error!(error = %e, "Failed to prepare timing-equalization hash");
                None
            }
        };
        Self { dummy_hash }
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        hash_with_random_salt(password)
    }

    /// Verifies a plaintext password against a stored Argon2id hash.
    ///
    /// Returns `Ok(true)` if the password matches, `Ok(false)` if not.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored password hash is malformed");
                return Ok(false);
            }
        };

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }

    /// Burn one verification for an identity that does not exist.
    pub fn verify_against_dummy(&self, password: &str) {
        if let Some(hash) = &self.dummy_hash {
            let _ = self.verify_password(password, hash);
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_with_random_salt(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

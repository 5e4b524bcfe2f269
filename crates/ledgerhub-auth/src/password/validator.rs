//! Password policy enforcement for new passwords.

use ledgerhub_core::config::AuthConfig;
use ledgerhub_core::error::AppError;

/// Length, character-class and guessability policy for new passwords.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length in characters.
    min_length: usize,
}

impl PasswordValidator {
    /// Build from `auth.password_min_length`.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Check a new password against the policy.
    ///
    /// `user_inputs` (such as the email) are penalized by the strength
    /// estimator. Returns the first violation found.
    pub fn validate(&self, password: &str, user_inputs: &[&str]) -> Result<(), AppError> {
        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        for (has_class, class) in CHARACTER_CLASSES {
            if !password.chars().any(has_class) {
                return Err(AppError::validation(format!(
                    "Password must contain at least one {class}"
                )));
            }
        }

        if zxcvbn::zxcvbn(password, user_inputs).score() < zxcvbn::Score::Three {
            return Err(AppError::validation(
                "Password is too easy to guess; use a longer or less common phrase",
            ));
        }

        Ok(())
    }

    /// Reject a new password equal to the current one.
    pub fn validate_not_same(&self, current: &str, new: &str) -> Result<(), AppError> {
        if current == new {
            return Err(AppError::validation(
                "New password must differ from the current password",
            ));
        }
        Ok(())
    }
}

/// Required character classes, checked in order.
const CHARACTER_CLASSES: [(fn(char) -> bool, &str); 4] = [
    (char::is_uppercase, "uppercase letter"),
    (char::is_lowercase, "lowercase letter"),
    (is_ascii_digit, "digit"),
    (is_special, "special character"),
];

fn is_ascii_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_special(c: char) -> bool {
    !c.is_alphanumeric()
}

//! Request DTOs with validation.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Login request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login email.
    #[validate(length(min = 1, max = 320, message = "Email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
    /// Optional device label stored with the session.
    #[validate(length(max = 255))]
    pub device_name: Option<String>,
}

/// Refresh token request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshRequest {
    /// The refresh token.
    #[validate(length(min = 1, max = 512, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Logout request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LogoutRequest {
    /// The refresh token to revoke.
    #[validate(length(min = 1, max = 512, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Switch the active tenant.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchTenantRequest {
    pub tenant_id: Uuid,
}

/// Switch the active company inside the current tenant.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchCompanyRequest {
    pub company_id: Uuid,
}

/// Change password request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, max = 1024, message = "Current password is required"))]
    pub current_password: String,
    /// New password. Strength is checked by the password validator.
    #[validate(length(min = 1, max = 1024, message = "New password is required"))]
    pub new_password: String,
}

/// Clear failed login attempts for an email and/or IP.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UnlockRequest {
    #[validate(length(max = 320))]
    pub email: Option<String>,
    #[validate(length(max = 64))]
    pub ip_address: Option<String>,
    /// Audit note stored with the cleared attempts.
    #[validate(length(min = 1, max = 500, message = "A reason is required"))]
    pub reason: String,
}

/// Provision a new tenant.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTenantRequest {
    /// Organization name.
    #[validate(length(min = 1, max = 200, message = "Tenant name is required"))]
    pub name: String,
    /// Owner identity. Defaults to the caller.
    pub owner_id: Option<Uuid>,
}

/// Record a successful payment for a tenant.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPaymentRequest {
    /// End of the paid billing period.
    pub current_period_end: chrono::DateTime<chrono::Utc>,
}

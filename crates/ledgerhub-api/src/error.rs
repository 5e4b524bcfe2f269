//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use ledgerhub_core::error::{AppError, ErrorDetail, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Optional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// HTTP-facing wrapper around [`AppError`].
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self(AppError::validation(format!("Invalid request: {errors}")))
    }
}

impl ApiError {
    /// Status code and wire code for an error kind.
    fn status(&self) -> (StatusCode, &'static str) {
        match self.0.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ErrorKind::AccountLocked => (StatusCode::LOCKED, "ACCOUNT_LOCKED"),
            ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorKind::Subscription => (StatusCode::PAYMENT_REQUIRED, "SUBSCRIPTION_REQUIRED"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::Internal
            | ErrorKind::Database
            | ErrorKind::Configuration
            | ErrorKind::Serialization => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, default_code) = self.status();
        let err = self.0;

        let mut retry_after = None;
        let (error_code, message, details) = match &err.detail {
            Some(ErrorDetail::Lockout {
                tier,
                retry_after_seconds,
                failure_count,
            }) => {
                retry_after = Some(*retry_after_seconds);
                (
                    default_code.to_string(),
                    err.message.clone(),
                    Some(json!({
                        "tier": tier,
                        "retry_after_seconds": retry_after_seconds,
                        "failure_count": failure_count,
                    })),
                )
            }
            Some(ErrorDetail::Subscription { code }) => {
                (code.as_str().to_string(), err.message.clone(), None)
            }
            None if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(kind = %err.kind, error = %err.message, "Internal server error");
                (
                    default_code.to_string(),
                    "Internal server error".to_string(),
                    None,
                )
            }
            None => (default_code.to_string(), err.message.clone(), None),
        };

        let body = ApiErrorResponse {
            success: false,
            error: error_code,
            message,
            details,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

//! Application error types.
//!
//! Each rejection kind carries a stable machine-readable code so clients
//! can distinguish, e.g., a deactivated account from a generic 403.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use mailview_core::auth::AuthError;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Wire shape for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No bearer credential supplied")]
    MissingCredential,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("No account for verified identity")]
    AccountNotFound,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// Machine-readable error code, also used in audit records.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::MissingCredential => "missing_credential",
            AppError::Unauthorized(_) => "invalid_credential",
            AppError::AccountNotFound => "account_not_found",
            AppError::NotFound(_) => "not_found",
            AppError::AccountDeactivated => "account_deactivated",
            AppError::Forbidden(_) => "insufficient_role",
            AppError::ProviderUnavailable(_) => "provider_unavailable",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MissingCredential | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AccountNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AccountDeactivated | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ProviderUnavailable(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Internal details stay out of responses.
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let body = Json(ErrorResponse {
            error: self.code().to_string(),
            message,
        });
        (self.status(), body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredential => AppError::MissingCredential,
            AuthError::InvalidCredential => {
                AppError::Unauthorized("Invalid or expired credential".into())
            }
            AuthError::AccountNotFound => AppError::AccountNotFound,
            AuthError::AccountDeactivated => AppError::AccountDeactivated,
            AuthError::InsufficientRole => {
                AppError::Forbidden("Role does not satisfy route requirement".into())
            }
            AuthError::ProviderUnavailable(msg) => AppError::ProviderUnavailable(msg),
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::Db(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deactivated_account_has_distinct_code() {
        // Both map to 403, but clients must be able to tell them apart.
        assert_eq!(AppError::AccountDeactivated.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_ne!(
            AppError::AccountDeactivated.code(),
            AppError::Forbidden("x".into()).code()
        );
    }

    #[test]
    fn provider_outage_is_retryable_server_error() {
        let err = AppError::from(AuthError::ProviderUnavailable("timeout".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "provider_unavailable");
    }

    #[test]
    fn credential_rejections_are_unauthorized() {
        assert_eq!(
            AppError::from(AuthError::MissingCredential).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::InvalidCredential).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}

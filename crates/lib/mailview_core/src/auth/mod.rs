//! Authentication and authorization logic.
//!
//! Provides session-token issuance and verification, the layered credential
//! verifier, the account directory, password hashing, and the audit sink.

pub mod audit;
pub mod directory;
pub mod jwt;
pub mod password;
pub mod verifier;

use thiserror::Error;

/// Authentication and authorization errors.
///
/// The first six variants are the rejection taxonomy surfaced to the route
/// layer; the rest are infrastructure failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No bearer credential supplied")]
    MissingCredential,

    #[error("Invalid or expired credential")]
    InvalidCredential,

    #[error("No account for verified identity")]
    AccountNotFound,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Role does not satisfy route requirement")]
    InsufficientRole,

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Machine-readable code for audit records and HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::InvalidCredential => "invalid_credential",
            AuthError::AccountNotFound => "account_not_found",
            AuthError::AccountDeactivated => "account_deactivated",
            AuthError::InsufficientRole => "insufficient_role",
            AuthError::ProviderUnavailable(_) => "provider_unavailable",
            AuthError::Validation(_) => "validation_error",
            AuthError::Db(_) => "db_error",
            AuthError::Internal(_) => "internal_error",
        }
    }
}

//! API server configuration.

use mailview_core::auth::jwt::resolve_jwt_secret;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3200").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret. Immutable for the process lifetime.
    pub jwt_secret: String,
    /// Google OAuth client id.
    pub google_client_id: String,
    /// Google OAuth client secret.
    pub google_client_secret: String,
    /// Encryption key for stored OAuth tokens.
    pub token_encryption_key: String,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                     | Default                                  |
    /// |------------------------------|------------------------------------------|
    /// | `BIND_ADDR`                  | `127.0.0.1:3200`                         |
    /// | `DATABASE_URL`               | `postgres://localhost:5432/mailview`     |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file            |
    /// | `GOOGLE_CLIENT_ID`           | empty (provider login disabled)          |
    /// | `GOOGLE_CLIENT_SECRET`       | empty                                    |
    /// | `TOKEN_ENCRYPTION_KEY`       | dev key, change in production            |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3200".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/mailview".into()),
            jwt_secret: resolve_jwt_secret(),
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: std::env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            token_encryption_key: std::env::var("TOKEN_ENCRYPTION_KEY")
                .unwrap_or_else(|_| "mailview-default-dev-key-change-in-production".into()),
        }
    }
}

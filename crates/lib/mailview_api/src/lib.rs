//! # mailview_api
//!
//! HTTP API library for Mailview.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use mailview_core::auth::verifier::CredentialVerifier;
use mailview_core::oauth::OAuthTokenStore;
use mailview_core::provider::IdentityProvider;

use crate::config::ApiConfig;
use crate::handlers::{accounts, audit, auth, mailbox};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// External identity provider client.
    pub provider: Arc<dyn IdentityProvider>,
    /// Layered credential verifier (local signature, then provider).
    pub verifier: Arc<CredentialVerifier>,
    /// Per-account OAuth token store.
    pub token_store: OAuthTokenStore,
}

impl AppState {
    /// Wire up the verifier and token store from configuration.
    pub fn new(pool: PgPool, config: ApiConfig, provider: Arc<dyn IdentityProvider>) -> Self {
        let verifier = Arc::new(CredentialVerifier::new(
            config.jwt_secret.as_bytes(),
            provider.clone(),
        ));
        let token_store = OAuthTokenStore::new(pool.clone(), config.token_encryption_key.clone());
        Self {
            pool,
            config,
            provider,
            verifier,
            token_store,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `mailview_core::migrate::migrate()` which owns the
/// migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    mailview_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/google", post(auth::google_login_handler))
        .route("/auth/admin/login", post(auth::admin_login_handler));

    // Authenticated routes (any active account)
    let protected = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/mailbox/link", post(mailbox::link_mailbox_handler))
        .route("/mailbox/messages", get(mailbox::list_messages_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    // Admin routes (active account with the admin role)
    let admin = Router::new()
        .route("/admin/accounts", get(accounts::list_accounts_handler))
        .route(
            "/admin/accounts/{id}/role",
            patch(accounts::set_role_handler),
        )
        .route(
            "/admin/accounts/{id}/status",
            patch(accounts::set_status_handler),
        )
        .route("/admin/audit", get(audit::list_audit_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin)
        .layer(cors)
        .with_state(state)
}

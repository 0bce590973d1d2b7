//! Authentication request handlers.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use mailview_core::models::auth::{AccountStatus, Role};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedPrincipal;
use crate::services::auth::{self, LoginMeta, SessionResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub subject_id: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
}

/// Client metadata for login auditing. The first hop in `X-Forwarded-For`
/// wins when present.
fn login_meta(headers: &HeaderMap) -> LoginMeta {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string());
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    LoginMeta { ip, user_agent }
}

/// `POST /auth/login` — authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let meta = login_meta(&headers);
    let resp = auth::login(&state, &body.email, &body.password, &meta).await?;
    Ok(Json(resp))
}

/// `POST /auth/register` — create a new email/password account.
pub async fn register_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<SessionResponse>> {
    let meta = login_meta(&headers);
    let resp = auth::register(
        &state,
        &body.email,
        &body.password,
        body.display_name.as_deref(),
        &meta,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /auth/google` — authenticate with a Google identity token.
pub async fn google_login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GoogleLoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let meta = login_meta(&headers);
    let resp = auth::google_login(&state, &body.id_token, &meta).await?;
    Ok(Json(resp))
}

/// `POST /auth/admin/login` — admin-elevated session (8 hours).
pub async fn admin_login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let meta = login_meta(&headers);
    let resp = auth::admin_login(&state, &body.email, &body.password, &meta).await?;
    Ok(Json(resp))
}

/// `GET /auth/me` — the caller's resolved principal.
pub async fn me_handler(
    Extension(AuthenticatedPrincipal(principal)): Extension<AuthenticatedPrincipal>,
) -> Json<MeResponse> {
    Json(MeResponse {
        subject_id: principal.subject_id,
        email: principal.email,
        role: principal.role,
        status: principal.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.9, 10.0.0.1".parse().unwrap(),
        );
        headers.insert(USER_AGENT, "test-agent/1.0".parse().unwrap());

        let meta = login_meta(&headers);
        assert_eq!(meta.ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(meta.user_agent.as_deref(), Some("test-agent/1.0"));
    }

    #[test]
    fn missing_headers_yield_empty_meta() {
        let meta = login_meta(&HeaderMap::new());
        assert!(meta.ip.is_none());
        assert!(meta.user_agent.is_none());
    }
}

//! Admin account management handlers.
//!
//! Role and status mutations are audited with the acting admin recorded in
//! the event details.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mailview_core::auth::{audit, directory};
use mailview_core::models::auth::{Account, AccountStatus, Role};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedPrincipal;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub last_login_user_agent: Option<String>,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            display_name: a.display_name,
            role: a.role,
            status: a.status,
            created_at: a.created_at,
            last_login: a.last_login,
            last_login_ip: a.last_login_ip,
            last_login_user_agent: a.last_login_user_agent,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

/// `GET /admin/accounts` — all accounts, newest first.
pub async fn list_accounts_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AccountResponse>>> {
    let accounts = directory::list_accounts(&state.pool).await?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// `PATCH /admin/accounts/{id}/role` — change an account's role.
pub async fn set_role_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedPrincipal(actor)): Extension<AuthenticatedPrincipal>,
    Path(id): Path<String>,
    Json(body): Json<SetRoleRequest>,
) -> AppResult<StatusCode> {
    let role = Role::parse(&body.role)
        .ok_or_else(|| AppError::Validation(format!("Unknown role '{}'", body.role)))?;

    directory::find_by_subject_id(&state.pool, &id)
        .await?
        .ok_or(AppError::AccountNotFound)?;

    directory::set_role(&state.pool, &id, role).await?;

    let details = serde_json::json!({ "actor": actor.subject_id, "role": role.as_str() });
    audit::record(
        &state.pool,
        audit::CATEGORY_ACCOUNT,
        "set_role",
        Some(&id),
        "success",
        Some(&details),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /admin/accounts/{id}/status` — activate or deactivate an account.
/// Deactivation is the only lifecycle exit; accounts are never deleted.
pub async fn set_status_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedPrincipal(actor)): Extension<AuthenticatedPrincipal>,
    Path(id): Path<String>,
    Json(body): Json<SetStatusRequest>,
) -> AppResult<StatusCode> {
    let status = AccountStatus::parse(&body.status)
        .ok_or_else(|| AppError::Validation(format!("Unknown status '{}'", body.status)))?;

    directory::find_by_subject_id(&state.pool, &id)
        .await?
        .ok_or(AppError::AccountNotFound)?;

    directory::set_status(&state.pool, &id, status).await?;

    let details = serde_json::json!({ "actor": actor.subject_id, "status": status.as_str() });
    audit::record(
        &state.pool,
        audit::CATEGORY_ACCOUNT,
        "set_status",
        Some(&id),
        "success",
        Some(&details),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

//! Authentication service — login and registration flows.

use serde::Serialize;
use tracing::info;

use mailview_core::auth::jwt::{ADMIN_SESSION_TTL_SECS, SESSION_TTL_SECS, issue_session_token};
use mailview_core::auth::{audit, directory, password};
use mailview_core::models::auth::{Account, AccountStatus, Role};
use mailview_core::provider::ProviderError;

use crate::AppState;
use crate::error::{AppError, AppResult};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

/// Client metadata recorded on explicit logins.
#[derive(Debug, Clone, Default)]
pub struct LoginMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Account fields exposed in session responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            display_name: account.display_name.clone(),
            role: account.role,
        }
    }
}

/// Response for every login variant.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub account: AccountSummary,
}

/// Issue a session token and record login metadata for an admitted account.
async fn open_session(
    state: &AppState,
    account: &Account,
    ttl_secs: i64,
    meta: &LoginMeta,
) -> AppResult<SessionResponse> {
    let token = issue_session_token(
        &account.id,
        account.role,
        &account.email,
        ttl_secs,
        state.config.jwt_secret.as_bytes(),
    )?;

    directory::record_login(
        &state.pool,
        &account.id,
        meta.ip.as_deref(),
        meta.user_agent.as_deref(),
    )
    .await?;

    Ok(SessionResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: ttl_secs,
        account: AccountSummary::from(account),
    })
}

async fn audit_login(state: &AppState, action: &str, subject: Option<&str>, outcome: &str) {
    audit::record(
        &state.pool,
        audit::CATEGORY_AUTH,
        action,
        subject,
        outcome,
        None,
    )
    .await;
}

/// Shared email/password credential check. Unknown email and wrong password
/// are indistinguishable to the caller.
async fn check_password_credentials(
    state: &AppState,
    email: &str,
    password_input: &str,
) -> AppResult<Account> {
    let row = directory::find_login_by_email(&state.pool, email).await?;

    let (account, pw_hash) = match row {
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
        Some(r) => r,
    };

    let pw_hash = match pw_hash {
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
        Some(h) => h,
    };

    if !password::verify_password(password_input, &pw_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    if account.status != AccountStatus::Active {
        return Err(AppError::AccountDeactivated);
    }

    Ok(account)
}

/// Authenticate with email + password. 7-day session.
pub async fn login(
    state: &AppState,
    email: &str,
    password_input: &str,
    meta: &LoginMeta,
) -> AppResult<SessionResponse> {
    let account = match check_password_credentials(state, email, password_input).await {
        Ok(account) => account,
        Err(e) => {
            audit_login(state, "login", None, e.code()).await;
            return Err(e);
        }
    };

    let resp = open_session(state, &account, SESSION_TTL_SECS, meta).await?;
    audit_login(state, "login", Some(&account.id), "success").await;
    Ok(resp)
}

/// Authenticate with email + password for an admin-elevated session.
///
/// The role check happens here, not just at admin routes: a non-admin never
/// receives an 8-hour token in the first place.
pub async fn admin_login(
    state: &AppState,
    email: &str,
    password_input: &str,
    meta: &LoginMeta,
) -> AppResult<SessionResponse> {
    let account = match check_password_credentials(state, email, password_input).await {
        Ok(account) => account,
        Err(e) => {
            audit_login(state, "admin_login", None, e.code()).await;
            return Err(e);
        }
    };

    if account.role != Role::Admin {
        audit_login(state, "admin_login", Some(&account.id), "insufficient_role").await;
        return Err(AppError::Forbidden(
            "Role does not satisfy route requirement".into(),
        ));
    }

    let resp = open_session(state, &account, ADMIN_SESSION_TTL_SECS, meta).await?;
    audit_login(state, "admin_login", Some(&account.id), "success").await;
    Ok(resp)
}

/// Register a new email/password account. The first account bootstraps as
/// admin; everyone after is a regular user.
pub async fn register(
    state: &AppState,
    email: &str,
    password_input: &str,
    display_name: Option<&str>,
    meta: &LoginMeta,
) -> AppResult<SessionResponse> {
    if password_input.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if directory::find_by_email(&state.pool, email).await?.is_some() {
        return Err(AppError::Validation("Email already registered".into()));
    }

    let is_first_account = directory::account_count(&state.pool).await? == 0;
    let role = if is_first_account { Role::Admin } else { Role::User };

    let pw_hash = password::hash_password(password_input)?;
    let subject_id = uuid::Uuid::new_v4().to_string();

    let account = directory::create_account_with_password(
        &state.pool,
        &subject_id,
        email,
        display_name,
        &pw_hash,
        role,
    )
    .await?;

    if is_first_account {
        info!(email, "first account granted admin role");
    }

    audit::record(
        &state.pool,
        audit::CATEGORY_ACCOUNT,
        "register",
        Some(&account.id),
        "success",
        None,
    )
    .await;

    open_session(state, &account, SESSION_TTL_SECS, meta).await
}

/// Authenticate with a Google-issued identity token.
///
/// This is the auto-provisioning call-site: a verified identity with no
/// directory record gets one, and a known email under a new subject id is
/// aliased onto the existing account.
pub async fn google_login(
    state: &AppState,
    id_token: &str,
    meta: &LoginMeta,
) -> AppResult<SessionResponse> {
    let identity = state
        .provider
        .verify_external_token(id_token)
        .await
        .map_err(|e| match e {
            ProviderError::Invalid => AppError::Unauthorized("Invalid identity token".into()),
            ProviderError::Unavailable(msg) => AppError::ProviderUnavailable(msg),
        })?;

    let account = directory::ensure_account(
        &state.pool,
        &identity.subject_id,
        &identity.email,
        identity.display_name.as_deref(),
    )
    .await?;

    if account.status != AccountStatus::Active {
        audit_login(state, "google_login", Some(&account.id), "account_deactivated").await;
        return Err(AppError::AccountDeactivated);
    }

    let resp = open_session(state, &account, SESSION_TTL_SECS, meta).await?;
    audit_login(state, "google_login", Some(&account.id), "success").await;
    Ok(resp)
}

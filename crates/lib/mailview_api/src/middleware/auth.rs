//! Authorization gate — bearer extraction, credential verification,
//! directory cross-check, role enforcement.
//!
//! One gate for every protected route. Per request:
//! extract bearer → verify claims → resolve account → status check →
//! role check → principal attached. The directory's role and status are
//! authoritative on every pass; the role inside a local token is only a
//! fast-path hint. Every terminal outcome is audited before the response
//! leaves, and an audit failure never changes the outcome.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum::http::header::AUTHORIZATION;

use mailview_core::auth::{AuthError, audit, directory};
use mailview_core::models::auth::{Account, AccountStatus, ClaimSet, Principal, Role};
use sqlx::PgPool;

use crate::AppState;
use crate::error::AppError;

/// Key used to store the [`Principal`] in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

/// Role demanded by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Any authenticated account.
    Any,
    Admin,
}

impl RoleRequirement {
    fn satisfied_by(self, role: Role) -> bool {
        match self {
            RoleRequirement::Any => true,
            RoleRequirement::Admin => role == Role::Admin,
        }
    }
}

/// Pull the raw token out of an `Authorization: Bearer <token>` header
/// value. Absent or malformed headers are a missing credential.
fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .ok_or(AuthError::MissingCredential)?
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredential)?;
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

/// Resolve verified claims to a directory account.
///
/// Provider-path claims (no role) additionally fall back to email lookup:
/// the directory may know the identity under a different subject id. The
/// gate never auto-provisions — that is an explicit choice of the
/// self-service login endpoints.
async fn resolve_account(pool: &PgPool, claims: &ClaimSet) -> Result<Account, AuthError> {
    if let Some(account) = directory::find_by_subject_id(pool, &claims.subject_id).await? {
        return Ok(account);
    }
    if claims.role.is_none()
        && let Some(account) = directory::find_by_email(pool, &claims.email).await?
    {
        return Ok(account);
    }
    Err(AuthError::AccountNotFound)
}

/// Status and role enforcement against the authoritative directory record.
fn evaluate_account(account: &Account, required: RoleRequirement) -> Result<Principal, AuthError> {
    if account.status != AccountStatus::Active {
        return Err(AuthError::AccountDeactivated);
    }
    if !required.satisfied_by(account.role) {
        return Err(AuthError::InsufficientRole);
    }
    Ok(Principal {
        subject_id: account.id.clone(),
        email: account.email.clone(),
        role: account.role,
        status: account.status,
    })
}

async fn run_gate(
    state: &AppState,
    header: Option<&str>,
    required: RoleRequirement,
) -> Result<Principal, (AuthError, Option<String>)> {
    let token = extract_bearer(header).map_err(|e| (e, None))?;
    let claims = state.verifier.verify(token).await.map_err(|e| (e, None))?;
    let subject = claims.subject_id.clone();
    let account = resolve_account(&state.pool, &claims)
        .await
        .map_err(|e| (e, Some(subject)))?;
    evaluate_account(&account, required).map_err(|e| (e, Some(account.id.clone())))
}

/// Run the gate and audit the terminal transition.
///
/// Side-effect-free on the admitted path apart from the audit record;
/// login metadata is written only by explicit login endpoints.
pub async fn authorize(
    state: &AppState,
    header: Option<&str>,
    required: RoleRequirement,
) -> Result<Principal, AppError> {
    match run_gate(state, header, required).await {
        Ok(principal) => {
            audit::record(
                &state.pool,
                audit::CATEGORY_AUTH,
                "gate",
                Some(&principal.subject_id),
                "admitted",
                None,
            )
            .await;
            Ok(principal)
        }
        Err((e, subject)) => {
            let details = serde_json::json!({ "reason": e.code() });
            audit::record(
                &state.pool,
                audit::CATEGORY_AUTH,
                "gate",
                subject.as_deref(),
                "rejected",
                Some(&details),
            )
            .await;
            Err(AppError::from(e))
        }
    }
}

/// Axum middleware: any authenticated, active account.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let principal = authorize(&state, header, RoleRequirement::Any).await?;
    request
        .extensions_mut()
        .insert(AuthenticatedPrincipal(principal));

    Ok(next.run(request).await)
}

/// Axum middleware: active account with the admin role.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let principal = authorize(&state, header, RoleRequirement::Admin).await?;
    request
        .extensions_mut()
        .insert(AuthenticatedPrincipal(principal));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account(role: Role, status: AccountStatus) -> Account {
        Account {
            id: "acct-1".into(),
            email: "a@example.com".into(),
            display_name: None,
            role,
            status,
            created_at: Utc::now(),
            last_login: None,
            last_login_ip: None,
            last_login_user_agent: None,
        }
    }

    #[test]
    fn bearer_extraction() {
        assert!(matches!(
            extract_bearer(None),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            extract_bearer(Some("Token abc")),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            extract_bearer(Some("Bearer ")),
            Err(AuthError::MissingCredential)
        ));
        assert_eq!(extract_bearer(Some("Bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn inactive_account_is_rejected_regardless_of_role() {
        let err = evaluate_account(
            &account(Role::Admin, AccountStatus::Inactive),
            RoleRequirement::Any,
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::AccountDeactivated));

        let err = evaluate_account(
            &account(Role::Admin, AccountStatus::Inactive),
            RoleRequirement::Admin,
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::AccountDeactivated));
    }

    #[test]
    fn user_role_cannot_pass_admin_requirement() {
        let err = evaluate_account(
            &account(Role::User, AccountStatus::Active),
            RoleRequirement::Admin,
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::InsufficientRole));
    }

    #[test]
    fn active_user_passes_any_requirement() {
        let principal = evaluate_account(
            &account(Role::User, AccountStatus::Active),
            RoleRequirement::Any,
        )
        .unwrap();
        assert_eq!(principal.subject_id, "acct-1");
        assert_eq!(principal.role, Role::User);
        assert_eq!(principal.status, AccountStatus::Active);
    }

    #[test]
    fn admin_passes_admin_requirement() {
        assert!(
            evaluate_account(
                &account(Role::Admin, AccountStatus::Active),
                RoleRequirement::Admin,
            )
            .is_ok()
        );
    }
}

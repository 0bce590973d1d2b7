//! Account directory — persisted role, status, and identity linkage.
//!
//! Read by every authorization decision; written by account lifecycle
//! operations. Mutations are audited by the caller, not here.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use super::AuthError;
use crate::models::auth::{Account, AccountStatus, Role};

/// Row tuple for an account, in column order.
type AccountRow = (
    String,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    Option<String>,
    Option<String>,
);

const ACCOUNT_COLUMNS: &str = "id, email, display_name, role, status, password_hash, \
     created_at, last_login, last_login_ip, last_login_user_agent";

/// Map a raw row into an [`Account`], dropping the password hash.
fn map_account(row: AccountRow) -> Result<Account, AuthError> {
    let role = Role::parse(&row.3)
        .ok_or_else(|| AuthError::Internal(format!("unknown role '{}' for account {}", row.3, row.0)))?;
    let status = AccountStatus::parse(&row.4)
        .ok_or_else(|| AuthError::Internal(format!("unknown status '{}' for account {}", row.4, row.0)))?;
    Ok(Account {
        id: row.0,
        email: row.1,
        display_name: row.2,
        role,
        status,
        created_at: row.6,
        last_login: row.7,
        last_login_ip: row.8,
        last_login_user_agent: row.9,
    })
}

async fn fetch_by_id(pool: &PgPool, id: &str) -> Result<Option<AccountRow>, AuthError> {
    let row = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Look up an account by subject id, following the alias table when the id
/// is not a primary account id. Unknown ids yield `Ok(None)`, never an error.
pub async fn find_by_subject_id(pool: &PgPool, id: &str) -> Result<Option<Account>, AuthError> {
    if let Some(row) = fetch_by_id(pool, id).await? {
        return Ok(Some(map_account(row)?));
    }

    // The subject may be an alias recorded on first login via a different
    // identity linkage.
    let canonical = sqlx::query_scalar::<_, String>(
        "SELECT account_id FROM account_aliases WHERE alias_id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match canonical {
        Some(canonical_id) => match fetch_by_id(pool, &canonical_id).await? {
            Some(row) => Ok(Some(map_account(row)?)),
            None => Ok(None),
        },
        None => Ok(None),
    }
}

/// Look up an account by email.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>, AuthError> {
    let row = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    row.map(map_account).transpose()
}

/// Fetch an account plus its password hash for the email/password login flow.
pub async fn find_login_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<(Account, Option<String>)>, AuthError> {
    let row = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(r) => {
            let hash = r.5.clone();
            Ok(Some((map_account(r)?, hash)))
        }
        None => Ok(None),
    }
}

/// Idempotent upsert used on first provider login.
///
/// Lookup by email precedes creation: if an account with this email already
/// exists under a different subject id, the existing account is reused and
/// the new subject id is recorded as an alias. Exactly one account per
/// email, always.
pub async fn ensure_account(
    pool: &PgPool,
    subject_id: &str,
    email: &str,
    display_name: Option<&str>,
) -> Result<Account, AuthError> {
    if let Some(existing) = find_by_email(pool, email).await? {
        if existing.id != subject_id {
            sqlx::query(
                "INSERT INTO account_aliases (alias_id, account_id) VALUES ($1, $2) \
                 ON CONFLICT (alias_id) DO NOTHING",
            )
            .bind(subject_id)
            .bind(&existing.id)
            .execute(pool)
            .await?;
            info!(alias = subject_id, account = %existing.id, "recorded subject alias");
        }
        return Ok(existing);
    }

    let row = sqlx::query_as::<_, AccountRow>(&format!(
        "INSERT INTO accounts (id, email, display_name) VALUES ($1, $2, $3) \
         RETURNING {ACCOUNT_COLUMNS}"
    ))
    .bind(subject_id)
    .bind(email)
    .bind(display_name)
    .fetch_one(pool)
    .await?;
    info!(account = subject_id, "provisioned account");
    map_account(row)
}

/// Create a password-credentialed account. Fails on duplicate email.
pub async fn create_account_with_password(
    pool: &PgPool,
    subject_id: &str,
    email: &str,
    display_name: Option<&str>,
    password_hash: &str,
    role: Role,
) -> Result<Account, AuthError> {
    let row = sqlx::query_as::<_, AccountRow>(&format!(
        "INSERT INTO accounts (id, email, display_name, password_hash, role) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {ACCOUNT_COLUMNS}"
    ))
    .bind(subject_id)
    .bind(email)
    .bind(display_name)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;
    map_account(row)
}

/// Set an account's lifecycle status. Soft only — rows are never deleted.
pub async fn set_status(pool: &PgPool, id: &str, status: AccountStatus) -> Result<(), AuthError> {
    sqlx::query("UPDATE accounts SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

/// Set an account's role.
pub async fn set_role(pool: &PgPool, id: &str, role: Role) -> Result<(), AuthError> {
    sqlx::query("UPDATE accounts SET role = $2 WHERE id = $1")
        .bind(id)
        .bind(role.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

/// Record login metadata. Called by explicit login endpoints only, never on
/// ordinary authenticated requests.
pub async fn record_login(
    pool: &PgPool,
    id: &str,
    ip: Option<&str>,
    user_agent: Option<&str>,
) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE accounts SET last_login = now(), last_login_ip = $2, \
         last_login_user_agent = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(ip)
    .bind(user_agent)
    .execute(pool)
    .await?;
    Ok(())
}

/// List all accounts, newest first. Admin surface.
pub async fn list_accounts(pool: &PgPool) -> Result<Vec<Account>, AuthError> {
    let rows = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(map_account).collect()
}

/// Count all accounts. Used for first-account admin bootstrap.
pub async fn account_count(pool: &PgPool) -> Result<i64, AuthError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

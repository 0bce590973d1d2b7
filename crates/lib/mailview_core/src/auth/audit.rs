//! Audit sink for auth and account-lifecycle events.
//!
//! `record` is fire-and-forget: a failed write is logged and swallowed, and
//! must never change the outcome of the request being audited.

use sqlx::PgPool;
use tracing::warn;

use super::AuthError;
use crate::models::auth::AuditEvent;
use crate::uuid::uuidv7;

/// Event categories.
pub const CATEGORY_AUTH: &str = "auth";
pub const CATEGORY_ACCOUNT: &str = "account";
pub const CATEGORY_MAILBOX: &str = "mailbox";

/// Record an audit event.
///
/// Never returns an error: rejection and admission outcomes must not be
/// altered by audit-sink failures.
pub async fn record(
    pool: &PgPool,
    category: &str,
    action: &str,
    subject_id: Option<&str>,
    outcome: &str,
    details: Option<&serde_json::Value>,
) {
    let result = sqlx::query(
        "INSERT INTO audit_log (id, category, action, subject_id, outcome, details) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(uuidv7())
    .bind(category)
    .bind(action)
    .bind(subject_id)
    .bind(outcome)
    .bind(details)
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!(category, action, outcome, "failed to record audit event: {e}");
    }
}

/// Most recent audit events, newest first. Feeds the admin audit viewer.
pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<AuditEvent>, AuthError> {
    let rows = sqlx::query_as::<
        _,
        (
            uuid::Uuid,
            String,
            String,
            Option<String>,
            String,
            Option<serde_json::Value>,
            chrono::DateTime<chrono::Utc>,
        ),
    >(
        "SELECT id, category, action, subject_id, outcome, details, created_at \
         FROM audit_log ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, category, action, subject_id, outcome, details, created_at)| AuditEvent {
                id,
                category,
                action,
                subject_id,
                outcome,
                details,
                created_at,
            },
        )
        .collect())
}

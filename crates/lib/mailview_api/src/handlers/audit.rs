//! Admin audit-log viewer handlers.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use mailview_core::auth::audit;
use mailview_core::models::auth::AuditEvent;

use crate::AppState;
use crate::error::AppResult;

/// Default page size for the audit viewer.
const DEFAULT_LIMIT: i64 = 100;
/// Upper bound on a single page.
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
}

/// `GET /admin/audit` — most recent audit events.
pub async fn list_audit_handler(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<Vec<AuditEvent>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let events = audit::recent(&state.pool, limit).await?;
    Ok(Json(events))
}

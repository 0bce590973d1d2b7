//! Mailbox handlers — Gmail linkage and message listing.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedPrincipal;
use crate::services::mailbox::{self, MailboxLinkResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMailboxRequest {
    pub code: String,
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesQuery {
    pub page_token: Option<String>,
    pub max_results: Option<u32>,
}

/// `POST /mailbox/link` — exchange an authorization code and store the
/// token grant for the calling account.
pub async fn link_mailbox_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedPrincipal(principal)): Extension<AuthenticatedPrincipal>,
    Json(body): Json<LinkMailboxRequest>,
) -> AppResult<Json<MailboxLinkResponse>> {
    let resp = mailbox::link_mailbox(&state, &principal, &body.code, &body.redirect_uri).await?;
    Ok(Json(resp))
}

/// `GET /mailbox/messages` — list messages from the linked mailbox,
/// refreshing the stored access token when needed.
pub async fn list_messages_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedPrincipal(principal)): Extension<AuthenticatedPrincipal>,
    Query(query): Query<ListMessagesQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let messages = mailbox::list_messages(
        &state,
        &principal,
        query.page_token.as_deref(),
        query.max_results,
    )
    .await?;
    Ok(Json(messages))
}

//! Mailbox service — Gmail linkage and message listing.
//!
//! Message payloads pass through untouched; parsing and formatting belong
//! to the client.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::debug;

use mailview_core::auth::audit;
use mailview_core::models::auth::Principal;
use mailview_core::models::oauth::OAuthTokenRecord;
use mailview_core::provider::ProviderError;

use crate::AppState;
use crate::error::{AppError, AppResult};

/// Gmail message listing endpoint.
const GMAIL_MESSAGES_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxLinkResponse {
    pub mailbox_email: Option<String>,
    pub scopes: Option<String>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Exchange an authorization code and persist the token grant for the
/// calling account.
pub async fn link_mailbox(
    state: &AppState,
    principal: &Principal,
    code: &str,
    redirect_uri: &str,
) -> AppResult<MailboxLinkResponse> {
    let tokens = state
        .provider
        .exchange_authorization_code(code, redirect_uri)
        .await
        .map_err(|e| match e {
            ProviderError::Invalid => {
                AppError::Validation("Authorization code rejected by provider".into())
            }
            ProviderError::Unavailable(msg) => AppError::ProviderUnavailable(msg),
        })?;

    let record = OAuthTokenRecord {
        account_id: principal.subject_id.clone(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_at: Utc::now() + Duration::seconds(tokens.expires_in),
        scopes: tokens.scope,
        mailbox_email: Some(principal.email.clone()),
    };
    state.token_store.upsert(&record).await?;

    audit::record(
        &state.pool,
        audit::CATEGORY_MAILBOX,
        "link",
        Some(&principal.subject_id),
        "success",
        None,
    )
    .await;

    Ok(MailboxLinkResponse {
        mailbox_email: record.mailbox_email,
        scopes: record.scopes,
        expires_at: record.expires_at,
    })
}

/// List mailbox messages for the calling account, refreshing the stored
/// access token first when it is near expiry. Raw Gmail JSON passthrough.
pub async fn list_messages(
    state: &AppState,
    principal: &Principal,
    page_token: Option<&str>,
    max_results: Option<u32>,
) -> AppResult<serde_json::Value> {
    let record = state
        .token_store
        .refresh_if_needed(state.provider.as_ref(), &principal.subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No linked mailbox".into()))?;

    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(token) = page_token {
        query.push(("pageToken", token.to_string()));
    }
    if let Some(n) = max_results {
        query.push(("maxResults", n.to_string()));
    }

    let resp = reqwest::Client::new()
        .get(GMAIL_MESSAGES_URL)
        .query(&query)
        .bearer_auth(&record.access_token)
        .send()
        .await
        .map_err(|e| AppError::ProviderUnavailable(format!("gmail request: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        debug!(%status, account = %principal.subject_id, "gmail list rejected");
        return Err(AppError::ProviderUnavailable(format!("gmail HTTP {status}")));
    }

    resp.json::<serde_json::Value>()
        .await
        .map_err(|e| AppError::ProviderUnavailable(format!("gmail response parse: {e}")))
}

//! OAuth token domain models.

use chrono::{DateTime, Utc};

/// Per-account Google OAuth tokens, decrypted form.
///
/// At most one record per account. `refresh_token`, once present, is
/// retained across refresh cycles even when a refresh response omits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthTokenRecord {
    pub account_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub scopes: Option<String>,
    pub mailbox_email: Option<String>,
}

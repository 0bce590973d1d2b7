//! Per-account OAuth token persistence and silent refresh.
//!
//! One record per account. Refresh fires inside a fixed skew window before
//! expiry; persistence is last-writer-wins, and concurrent refreshes for
//! the same account may each call the provider.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::auth::AuthError;
use crate::models::oauth::OAuthTokenRecord;
use crate::provider::{IdentityProvider, ProviderError, ProviderTokens};
use crate::secrets;

/// Safety margin before actual expiry that triggers proactive refresh.
pub const REFRESH_SKEW_SECS: i64 = 5 * 60;

/// Whether an access token is due for refresh at `now`.
pub fn needs_refresh(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > expires_at - Duration::seconds(REFRESH_SKEW_SECS)
}

/// Fold a refresh response into an existing record.
///
/// The previously stored refresh token is kept when the provider omits a
/// new one — refresh tokens are not reissued on every cycle.
pub fn apply_refresh(
    record: &OAuthTokenRecord,
    tokens: &ProviderTokens,
    now: DateTime<Utc>,
) -> OAuthTokenRecord {
    OAuthTokenRecord {
        account_id: record.account_id.clone(),
        access_token: tokens.access_token.clone(),
        refresh_token: tokens
            .refresh_token
            .clone()
            .or_else(|| record.refresh_token.clone()),
        expires_at: now + Duration::seconds(tokens.expires_in),
        scopes: tokens.scope.clone().or_else(|| record.scopes.clone()),
        mailbox_email: record.mailbox_email.clone(),
    }
}

/// Persisted store of per-account provider tokens, encrypted at rest.
#[derive(Clone)]
pub struct OAuthTokenStore {
    pool: PgPool,
    encryption_key: String,
}

impl OAuthTokenStore {
    pub fn new(pool: PgPool, encryption_key: String) -> Self {
        Self {
            pool,
            encryption_key,
        }
    }

    /// Fetch and decrypt the token record for an account.
    pub async fn get(&self, subject_id: &str) -> Result<Option<OAuthTokenRecord>, AuthError> {
        let row = sqlx::query_as::<
            _,
            (
                String,
                Option<String>,
                DateTime<Utc>,
                Option<String>,
                Option<String>,
            ),
        >(
            "SELECT access_token, refresh_token, expires_at, scopes, mailbox_email \
             FROM oauth_tokens WHERE account_id = $1",
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((access_enc, refresh_enc, expires_at, scopes, mailbox_email)) = row else {
            return Ok(None);
        };

        let access_token = secrets::decrypt(&access_enc, &self.encryption_key)?;
        let refresh_token = refresh_enc
            .map(|enc| secrets::decrypt(&enc, &self.encryption_key))
            .transpose()?;

        Ok(Some(OAuthTokenRecord {
            account_id: subject_id.to_string(),
            access_token,
            refresh_token,
            expires_at,
            scopes,
            mailbox_email,
        }))
    }

    /// Insert or update the token record for an account.
    ///
    /// A stored refresh token is never clobbered by an absent one: the
    /// update coalesces onto the existing column value.
    pub async fn upsert(&self, record: &OAuthTokenRecord) -> Result<(), AuthError> {
        let access_enc = secrets::encrypt(&record.access_token, &self.encryption_key)?;
        let refresh_enc = record
            .refresh_token
            .as_deref()
            .map(|t| secrets::encrypt(t, &self.encryption_key))
            .transpose()?;

        sqlx::query(
            "INSERT INTO oauth_tokens \
             (account_id, access_token, refresh_token, expires_at, scopes, mailbox_email, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, now()) \
             ON CONFLICT (account_id) DO UPDATE SET \
               access_token = EXCLUDED.access_token, \
               refresh_token = COALESCE(EXCLUDED.refresh_token, oauth_tokens.refresh_token), \
               expires_at = EXCLUDED.expires_at, \
               scopes = COALESCE(EXCLUDED.scopes, oauth_tokens.scopes), \
               mailbox_email = COALESCE(EXCLUDED.mailbox_email, oauth_tokens.mailbox_email), \
               updated_at = now()",
        )
        .bind(&record.account_id)
        .bind(&access_enc)
        .bind(&refresh_enc)
        .bind(record.expires_at)
        .bind(&record.scopes)
        .bind(&record.mailbox_email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Return the account's token record, silently refreshing it when the
    /// access token is inside the skew window.
    ///
    /// `Ok(None)` when no mailbox is linked. Without a refresh token the
    /// stale record is returned unchanged — expiry is not remediable, and
    /// the caller surfaces the provider failure.
    pub async fn refresh_if_needed(
        &self,
        provider: &dyn IdentityProvider,
        subject_id: &str,
    ) -> Result<Option<OAuthTokenRecord>, AuthError> {
        let Some(record) = self.get(subject_id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if !needs_refresh(record.expires_at, now) {
            return Ok(Some(record));
        }

        let Some(refresh_token) = record.refresh_token.clone() else {
            debug!(account = subject_id, "access token stale, no refresh token on record");
            return Ok(Some(record));
        };

        let tokens = provider
            .refresh_access_token(&refresh_token)
            .await
            .map_err(|e| match e {
                ProviderError::Invalid => {
                    AuthError::ProviderUnavailable("refresh token no longer accepted".into())
                }
                ProviderError::Unavailable(msg) => AuthError::ProviderUnavailable(msg),
            })?;

        let refreshed = apply_refresh(&record, &tokens, now);
        self.upsert(&refreshed).await?;
        info!(account = subject_id, "refreshed provider access token");
        Ok(Some(refreshed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expires_at: DateTime<Utc>, refresh: Option<&str>) -> OAuthTokenRecord {
        OAuthTokenRecord {
            account_id: "acct-1".into(),
            access_token: "old-access".into(),
            refresh_token: refresh.map(String::from),
            expires_at,
            scopes: Some("gmail.readonly".into()),
            mailbox_email: Some("a@gmail.com".into()),
        }
    }

    #[test]
    fn fresh_token_is_not_refreshed() {
        let now = Utc::now();
        // 10 minutes of validity left — outside the 5-minute skew window.
        assert!(!needs_refresh(now + Duration::minutes(10), now));
    }

    #[test]
    fn token_inside_skew_window_is_refreshed() {
        let now = Utc::now();
        assert!(needs_refresh(now + Duration::minutes(4), now));
    }

    #[test]
    fn expired_token_is_refreshed() {
        let now = Utc::now();
        assert!(needs_refresh(now - Duration::minutes(10), now));
    }

    #[test]
    fn refresh_keeps_old_refresh_token_when_omitted() {
        let now = Utc::now();
        let old = record(now - Duration::minutes(10), Some("refresh-1"));
        let tokens = ProviderTokens {
            access_token: "new-access".into(),
            refresh_token: None,
            expires_in: 3600,
            scope: None,
        };

        let merged = apply_refresh(&old, &tokens, now);
        assert_eq!(merged.access_token, "new-access");
        assert_eq!(merged.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(merged.expires_at, now + Duration::seconds(3600));
        assert_eq!(merged.scopes.as_deref(), Some("gmail.readonly"));
    }

    #[test]
    fn refresh_adopts_reissued_refresh_token() {
        let now = Utc::now();
        let old = record(now, Some("refresh-1"));
        let tokens = ProviderTokens {
            access_token: "new-access".into(),
            refresh_token: Some("refresh-2".into()),
            expires_in: 3600,
            scope: Some("gmail.readonly openid".into()),
        };

        let merged = apply_refresh(&old, &tokens, now);
        assert_eq!(merged.refresh_token.as_deref(), Some("refresh-2"));
        assert_eq!(merged.scopes.as_deref(), Some("gmail.readonly openid"));
    }
}

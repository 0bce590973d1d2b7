//! Identity provider client.
//!
//! The provider is an opaque external service: it asserts the validity of
//! tokens it issued, refreshes access tokens, and exchanges authorization
//! codes. [`GoogleIdentityProvider`] is the production implementation; tests
//! substitute mock impls of [`IdentityProvider`].

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Google's OAuth2 token endpoint.
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google's id-token introspection endpoint.
const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Identity asserted by the provider for a verified external token.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub subject_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Tokens returned by a code exchange or a refresh call.
///
/// `refresh_token` is optional: the provider does not reissue one on every
/// refresh.
#[derive(Debug, Clone)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub scope: Option<String>,
}

/// Provider call failures.
///
/// `Invalid` is a definitive rejection of the presented credential;
/// `Unavailable` is transient (network, 5xx) and safe for the caller to
/// retry. The two are never conflated.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider rejected the credential")]
    Invalid,

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// External identity provider operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Ask the provider whether `token` is a valid identity token it issued.
    async fn verify_external_token(&self, token: &str)
    -> Result<ExternalIdentity, ProviderError>;

    /// Exchange a refresh token for a fresh access token.
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<ProviderTokens, ProviderError>;

    /// Exchange an authorization code for an initial token grant.
    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ProviderTokens, ProviderError>;
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
    scope: Option<String>,
}

/// Response from Google's tokeninfo endpoint.
#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    sub: String,
    email: String,
    name: Option<String>,
    aud: Option<String>,
}

/// Google OAuth2 implementation of [`IdentityProvider`].
pub struct GoogleIdentityProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    tokeninfo_url: String,
}

impl GoogleIdentityProvider {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            token_url: GOOGLE_TOKEN_URL.to_string(),
            tokeninfo_url: GOOGLE_TOKENINFO_URL.to_string(),
        }
    }

    /// Override the Google endpoints (integration tests point these at a
    /// local stub).
    pub fn with_endpoints(mut self, token_url: String, tokeninfo_url: String) -> Self {
        self.token_url = token_url;
        self.tokeninfo_url = tokeninfo_url;
        self
    }

    /// POST to the token endpoint, splitting definitive rejections (4xx)
    /// from transient failures.
    async fn token_request(
        &self,
        params: &[(&str, &str)],
    ) -> Result<ProviderTokens, ProviderError> {
        let resp = self
            .client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("token request: {e}")))?;

        let status = resp.status();
        if status.is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            debug!(%status, body, "token endpoint rejected request");
            return Err(ProviderError::Invalid);
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!(
                "token endpoint HTTP {status}"
            )));
        }

        let tokens = resp
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("token response parse: {e}")))?;

        Ok(ProviderTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            scope: tokens.scope,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn verify_external_token(
        &self,
        token: &str,
    ) -> Result<ExternalIdentity, ProviderError> {
        let resp = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("tokeninfo request: {e}")))?;

        let status = resp.status();
        if status.is_client_error() {
            return Err(ProviderError::Invalid);
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!(
                "tokeninfo HTTP {status}"
            )));
        }

        let info = resp
            .json::<GoogleTokenInfo>()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("tokeninfo parse: {e}")))?;

        // A token minted for another client is not a credential for us.
        if let Some(aud) = &info.aud
            && *aud != self.client_id
        {
            debug!(aud, "tokeninfo audience mismatch");
            return Err(ProviderError::Invalid);
        }

        Ok(ExternalIdentity {
            subject_id: info.sub,
            email: info.email,
            display_name: info.name,
        })
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<ProviderTokens, ProviderError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ProviderTokens, ProviderError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }
}

//! Layered credential verification.
//!
//! A bearer credential is checked against an ordered list of verification
//! strategies. Local signature verification always runs first, provider
//! verification second; the ordering is fixed.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::AuthError;
use super::jwt::verify_session_token;
use crate::models::auth::ClaimSet;
use crate::provider::{IdentityProvider, ProviderError};

/// A single way of turning a raw bearer string into a [`ClaimSet`].
///
/// Returning `Err(AuthError::InvalidCredential)` lets the chain fall
/// through to the next strategy; any other error aborts the chain.
#[async_trait]
pub trait VerifyStrategy: Send + Sync {
    async fn verify(&self, token: &str) -> Result<ClaimSet, AuthError>;

    fn name(&self) -> &str;
}

/// Local HS256 signature verification against the service signing secret.
pub struct LocalTokenStrategy {
    secret: Vec<u8>,
}

impl LocalTokenStrategy {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }
}

#[async_trait]
impl VerifyStrategy for LocalTokenStrategy {
    async fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        verify_session_token(token, &self.secret)
            .map(|claims| claims.into_claim_set())
            .ok_or(AuthError::InvalidCredential)
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Provider-issued identity token verification.
///
/// The provider asserts validity; the resulting claim set carries no role —
/// role is resolved later from the account directory.
pub struct ProviderTokenStrategy {
    provider: Arc<dyn IdentityProvider>,
}

impl ProviderTokenStrategy {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl VerifyStrategy for ProviderTokenStrategy {
    async fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        match self.provider.verify_external_token(token).await {
            Ok(identity) => Ok(ClaimSet {
                subject_id: identity.subject_id,
                email: identity.email,
                role: None,
                display_name: identity.display_name,
                issued_at: None,
            }),
            Err(ProviderError::Invalid) => Err(AuthError::InvalidCredential),
            Err(ProviderError::Unavailable(msg)) => Err(AuthError::ProviderUnavailable(msg)),
        }
    }

    fn name(&self) -> &str {
        "provider"
    }
}

/// Tries each strategy in order until one yields a claim set.
///
/// Pure with respect to state other than time (expiry checks read the
/// clock); no side effects, safe to retry.
pub struct CredentialVerifier {
    strategies: Vec<Arc<dyn VerifyStrategy>>,
}

impl CredentialVerifier {
    /// Standard chain: local signature first, provider second.
    pub fn new(secret: &[u8], provider: Arc<dyn IdentityProvider>) -> Self {
        Self::with_strategies(vec![
            Arc::new(LocalTokenStrategy::new(secret)),
            Arc::new(ProviderTokenStrategy::new(provider)),
        ])
    }

    /// Custom strategy chain, tried in the given order.
    pub fn with_strategies(strategies: Vec<Arc<dyn VerifyStrategy>>) -> Self {
        Self { strategies }
    }

    /// Verify a raw bearer credential.
    ///
    /// `InvalidCredential` when every strategy rejects the token;
    /// `ProviderUnavailable` is passed through rather than masked as an
    /// invalid credential.
    pub async fn verify(&self, raw: &str) -> Result<ClaimSet, AuthError> {
        if raw.is_empty() {
            return Err(AuthError::InvalidCredential);
        }
        for strategy in &self.strategies {
            match strategy.verify(raw).await {
                Ok(claims) => {
                    debug!(strategy = strategy.name(), subject = %claims.subject_id, "credential verified");
                    return Ok(claims);
                }
                Err(AuthError::InvalidCredential) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(AuthError::InvalidCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::issue_session_token;
    use crate::models::auth::Role;
    use crate::provider::{ExternalIdentity, ProviderTokens};

    const SECRET: &[u8] = b"verifier-test-secret";

    /// Mock provider with a programmed verification outcome.
    struct MockProvider {
        outcome: Result<ExternalIdentity, ProviderError>,
    }

    impl MockProvider {
        fn valid(subject_id: &str, email: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(ExternalIdentity {
                    subject_id: subject_id.into(),
                    email: email.into(),
                    display_name: Some("Mock User".into()),
                }),
            })
        }

        fn invalid() -> Arc<Self> {
            Arc::new(Self {
                outcome: Err(ProviderError::Invalid),
            })
        }

        fn unavailable() -> Arc<Self> {
            Arc::new(Self {
                outcome: Err(ProviderError::Unavailable("connection refused".into())),
            })
        }
    }

    #[async_trait]
    impl IdentityProvider for MockProvider {
        async fn verify_external_token(
            &self,
            _token: &str,
        ) -> Result<ExternalIdentity, ProviderError> {
            match &self.outcome {
                Ok(id) => Ok(id.clone()),
                Err(ProviderError::Invalid) => Err(ProviderError::Invalid),
                Err(ProviderError::Unavailable(m)) => Err(ProviderError::Unavailable(m.clone())),
            }
        }

        async fn refresh_access_token(
            &self,
            _refresh_token: &str,
        ) -> Result<ProviderTokens, ProviderError> {
            unimplemented!("not used by verifier tests")
        }

        async fn exchange_authorization_code(
            &self,
            _code: &str,
            _redirect_uri: &str,
        ) -> Result<ProviderTokens, ProviderError> {
            unimplemented!("not used by verifier tests")
        }
    }

    #[tokio::test]
    async fn local_token_verifies_with_role() {
        let verifier = CredentialVerifier::new(SECRET, MockProvider::invalid());
        let token =
            issue_session_token("acct-1", Role::Admin, "a@example.com", 3600, SECRET).unwrap();

        let claims = verifier.verify(&token).await.unwrap();
        assert_eq!(claims.subject_id, "acct-1");
        assert_eq!(claims.role, Some(Role::Admin));
    }

    #[tokio::test]
    async fn local_path_wins_even_when_provider_is_down() {
        // Ordering: the provider is never consulted for a valid local token.
        let verifier = CredentialVerifier::new(SECRET, MockProvider::unavailable());
        let token =
            issue_session_token("acct-2", Role::User, "b@example.com", 3600, SECRET).unwrap();

        assert!(verifier.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn provider_token_falls_through_with_role_absent() {
        let verifier =
            CredentialVerifier::new(SECRET, MockProvider::valid("google-sub-9", "c@example.com"));

        let claims = verifier.verify("opaque-google-id-token").await.unwrap();
        assert_eq!(claims.subject_id, "google-sub-9");
        assert_eq!(claims.email, "c@example.com");
        assert_eq!(claims.role, None);
    }

    #[tokio::test]
    async fn both_paths_failing_is_invalid_credential() {
        let verifier = CredentialVerifier::new(SECRET, MockProvider::invalid());

        let err = verifier.verify("junk").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn expired_local_token_rejected_by_both_paths() {
        let verifier = CredentialVerifier::new(SECRET, MockProvider::invalid());
        let token =
            issue_session_token("acct-3", Role::User, "d@example.com", -1, SECRET).unwrap();

        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn provider_outage_is_not_invalid_credential() {
        let verifier = CredentialVerifier::new(SECRET, MockProvider::unavailable());

        let err = verifier.verify("opaque-google-id-token").await.unwrap_err();
        assert!(matches!(err, AuthError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn empty_credential_is_invalid() {
        let verifier = CredentialVerifier::new(SECRET, MockProvider::valid("s", "e@example.com"));
        assert!(matches!(
            verifier.verify("").await.unwrap_err(),
            AuthError::InvalidCredential
        ));
    }
}

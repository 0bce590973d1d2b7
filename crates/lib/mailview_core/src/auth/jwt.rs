//! Session token issuance and local verification.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

use super::AuthError;
use crate::models::auth::{ClaimSet, Role, TokenClaims};

/// General session lifetime: 7 days.
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Admin-elevated session lifetime: 8 hours.
pub const ADMIN_SESSION_TTL_SECS: i64 = 8 * 60 * 60;

/// Mint a signed session token (HS256) embedding identity, role, and
/// issuance time.
///
/// `ttl_secs` is fixed per call-site ([`SESSION_TTL_SECS`] for general
/// login, [`ADMIN_SESSION_TTL_SECS`] for admin login) — never derived from
/// the request.
pub fn issue_session_token(
    subject_id: &str,
    role: Role,
    email: &str,
    ttl_secs: i64,
    secret: &[u8],
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: subject_id.to_string(),
        email: email.to_string(),
        role,
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Verify a locally-signed session token, returning the claims on success.
///
/// Succeeds only if both signature and expiry are valid. Expiry has no
/// leeway: a token is invalid the second its window closes.
pub fn verify_session_token(token: &str, secret: &[u8]) -> Option<TokenClaims> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;
    decode::<TokenClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

impl TokenClaims {
    /// Convert decoded claims into a [`ClaimSet`] for directory resolution.
    pub fn into_claim_set(self) -> ClaimSet {
        ClaimSet {
            subject_id: self.sub,
            email: self.email,
            role: Some(self.role),
            display_name: None,
            issued_at: DateTime::<Utc>::from_timestamp(self.iat, 0),
        }
    }
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    // Generate and persist
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailview")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-signing-secret";

    #[test]
    fn issue_then_verify_round_trip() {
        let token =
            issue_session_token("acct-1", Role::User, "a@example.com", SESSION_TTL_SECS, SECRET)
                .unwrap();
        let claims = verify_session_token(&token, SECRET).expect("token should verify");
        assert_eq!(claims.sub, "acct-1");
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn admin_role_survives_round_trip() {
        let token = issue_session_token(
            "acct-2",
            Role::Admin,
            "root@example.com",
            ADMIN_SESSION_TTL_SECS,
            SECRET,
        )
        .unwrap();
        let claims = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn expired_token_is_rejected() {
        // A token whose validity window already closed.
        let token =
            issue_session_token("acct-3", Role::Admin, "x@example.com", -1, SECRET).unwrap();
        assert!(verify_session_token(&token, SECRET).is_none());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token =
            issue_session_token("acct-4", Role::User, "y@example.com", 60, SECRET).unwrap();
        assert!(verify_session_token(&token, b"other-secret").is_none());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_session_token("not-a-jwt", SECRET).is_none());
        assert!(verify_session_token("", SECRET).is_none());
    }

    #[test]
    fn claims_convert_to_claim_set_with_role() {
        let token =
            issue_session_token("acct-5", Role::User, "z@example.com", 60, SECRET).unwrap();
        let set = verify_session_token(&token, SECRET).unwrap().into_claim_set();
        assert_eq!(set.subject_id, "acct-5");
        assert_eq!(set.role, Some(Role::User));
        assert!(set.issued_at.is_some());
    }
}

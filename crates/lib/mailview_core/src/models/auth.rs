//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API response shapes
//! (which carry `#[serde(rename)]` for camelCase etc.).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role. Exactly one per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Parse the persisted text form. Unknown values return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Account lifecycle status. Accounts are deactivated, never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(AccountStatus::Active),
            "inactive" => Some(AccountStatus::Inactive),
            _ => None,
        }
    }
}

/// Persisted account record.
///
/// `id` is the identity subject id: stable, provider-independent, immutable
/// once assigned. The password hash is deliberately not part of this struct.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub last_login_user_agent: Option<String>,
}

/// JWT claims embedded in locally-issued session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — account id (standard JWT `sub` claim).
    pub sub: String,
    /// Account email.
    pub email: String,
    /// Role at issuance time. A fast-path hint only; the directory's role
    /// is re-read on every gate pass.
    pub role: Role,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

/// Decoded fields extracted from a credential, prior to directory
/// cross-checking.
///
/// Locally-signed tokens yield a role; provider-issued tokens don't —
/// their role is resolved from the account directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    pub subject_id: String,
    pub email: String,
    pub role: Option<Role>,
    pub display_name: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
}

/// The verified, role-and-status-resolved identity attached to an
/// authorized request. Read-only to downstream handlers.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub subject_id: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
}

/// A row from the audit log.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub id: uuid::Uuid,
    pub category: String,
    pub action: String,
    pub subject_id: Option<String>,
    pub outcome: String,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_text_round_trip() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse(Role::User.as_str()), Some(Role::User));
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn status_text_round_trip() {
        assert_eq!(AccountStatus::parse("inactive"), Some(AccountStatus::Inactive));
        assert_eq!(AccountStatus::parse(""), None);
    }
}

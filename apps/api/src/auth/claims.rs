//! Identity claims carried by access and refresh tokens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Moderator,
    Doctor,
    Patient,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Token class. Each class has its own secret and lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

impl TokenClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
        }
    }
}

/// The issuable part of the claims: who the token speaks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Opaque subject identifier (user id)
    pub user_id: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            role,
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Full claim set as encoded in a signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    #[serde(flatten)]
    pub identity: Identity,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    /// Random per-token id
    pub jti: String,
    pub typ: TokenClass,
}

impl IdentityClaims {
    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    pub fn role(&self) -> Role {
        self.identity.role
    }
}

/// Identity context attached to an in-flight request by the auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub claims: IdentityClaims,
}

impl AuthContext {
    pub fn new(claims: IdentityClaims) -> Self {
        Self { claims }
    }

    pub fn user_id(&self) -> &str {
        self.claims.user_id()
    }

    pub fn role(&self) -> Role {
        self.claims.role()
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }
}

//! Token claim payloads (RFC 7519 registered claim names).
//!
//! Claims exist only inside a signed token and are never persisted;
//! validity is entirely determined by signature and expiry at parse time.

use serde::{Deserialize, Serialize};

/// Payload of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user id)
    pub sub: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Payload of a refresh token. Same shape as `AccessClaims`, but the two
/// kinds are never interchangeable: each is signed with its own secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Parsed claims, tagged with the kind they were validated under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

impl Claims {
    pub fn subject(&self) -> i64 {
        match self {
            Claims::Access(c) => c.sub,
            Claims::Refresh(c) => c.sub,
        }
    }

    pub fn issued_at(&self) -> i64 {
        match self {
            Claims::Access(c) => c.iat,
            Claims::Refresh(c) => c.iat,
        }
    }

    pub fn expires_at(&self) -> i64 {
        match self {
            Claims::Access(c) => c.exp,
            Claims::Refresh(c) => c.exp,
        }
    }
}

//! Authentication core
//!
//! Token codec (access/refresh issuance and parsing), credential
//! verification, and session orchestration.

mod claims;
mod password;
pub mod session;
mod token;

pub use claims::{AccessClaims, Claims, RefreshClaims};
pub use password::{hash_password, verify_password};
pub use token::{TokenCodec, TokenError, TokenKind};

//! Password hashing and verification (bcrypt).

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;

/// Hash a password with bcrypt. Salted: hashing the same input twice yields
/// different strings, both of which verify against the input.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

/// Verify a password against its stored hash.
///
/// A stored hash that cannot be parsed counts as a mismatch rather than an
/// error: the caller must not be able to distinguish the two cases.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match verify(password, stored_hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash could not be parsed");
            false
        }
    }
}

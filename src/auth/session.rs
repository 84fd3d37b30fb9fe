//! Session issuance and refresh.
//!
//! Registration and login end in the same place: a freshly minted access
//! token plus a refresh token for the same subject. Refresh validates the
//! presented refresh token and mints a new access token only — the refresh
//! token itself is not rotated, so its validity window is fixed at issuance.

use chrono::{DateTime, Utc};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{TokenCodec, TokenKind};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::store::UserStore;

/// Result of a successful registration or login.
#[derive(Debug)]
pub struct SessionTokens {
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: String,
}

fn issue_pair(
    codec: &TokenCodec,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<SessionTokens, AppError> {
    let access_token = codec.issue(user_id, TokenKind::Access, now)?;
    let refresh_token = codec.issue(user_id, TokenKind::Refresh, now)?;
    Ok(SessionTokens {
        user_id,
        access_token,
        refresh_token,
    })
}

/// Create a new user and open a session for it.
///
/// Fails with a conflict when the email is already registered. The
/// existence pre-check covers the common case; a concurrent insert racing
/// past it is caught by the unique constraint and maps to the same
/// conflict.
pub async fn register<S: UserStore>(
    store: &S,
    codec: &TokenCodec,
    name: &str,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<SessionTokens, AppError> {
    if store.find_by_email(email).await?.is_some() {
        return Err(AppError::Database(DatabaseError::UniqueConstraintViolation(
            "email already registered".to_string(),
        )));
    }

    let password_hash = hash_password(password)?;
    let user_id = store.insert(name, email, &password_hash).await?;

    tracing::info!(user_id, "user registered");
    issue_pair(codec, user_id, now)
}

/// Open a session for an existing user.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login<S: UserStore>(
    store: &S,
    codec: &TokenCodec,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<SessionTokens, AppError> {
    let user = store
        .find_by_email(email)
        .await?
        .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

    if !verify_password(password, &user.user_pass) {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    tracing::info!(user_id = user.user_id, "user logged in");
    issue_pair(codec, user.user_id, now)
}

/// Exchange a valid refresh token for a new access token.
///
/// Every parse failure collapses to the same unauthorized error; the
/// internal reason is logged here, at the boundary.
pub fn refresh(
    codec: &TokenCodec,
    refresh_token: &str,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let claims = codec
        .parse(refresh_token, TokenKind::Refresh, now)
        .map_err(|e| {
            tracing::warn!(reason = %e, "refresh token rejected");
            AppError::Auth(AuthError::TokenInvalid)
        })?;

    codec
        .issue(claims.subject(), TokenKind::Access, now)
        .map_err(AppError::from)
}

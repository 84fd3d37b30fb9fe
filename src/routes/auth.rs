//! Authentication routes
//!
//! Registration, login, token refresh, logout and the authenticated
//! identity check. The access token travels in the response body and comes
//! back in the Authorization header; the refresh token travels only in an
//! HTTP-only cookie.

use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie},
    web, HttpRequest, HttpResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{session, AccessClaims, TokenCodec, TokenKind};
use crate::error::{AppError, AuthError, DatabaseError, ValidationError};
use crate::store::{PgUserStore, UserStore};
use crate::validators::{is_valid_email, is_valid_name};

pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by register and login.
#[derive(Serialize)]
pub struct AuthResponse {
    pub user_id: i64,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Body returned by refresh. No new refresh token: the existing cookie
/// stays valid until its original expiry.
#[derive(Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

fn refresh_cookie(token: String, ttl_seconds: i64) -> Cookie<'static> {
    Cookie::build(REFRESH_TOKEN_COOKIE, token)
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::seconds(ttl_seconds))
        .finish()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(REFRESH_TOKEN_COOKIE, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.make_removal();
    cookie
}

/// POST /auth/register
///
/// # Errors
/// - 400: invalid email, name, or empty password
/// - 409: email already registered
/// - 5xx: storage failure
pub async fn register(
    form: web::Json<RegisterRequest>,
    store: web::Data<PgUserStore>,
    codec: web::Data<TokenCodec>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    let name = is_valid_name(&form.name)?;
    if form.password.is_empty() {
        return Err(ValidationError::EmptyField("password").into());
    }

    let tokens = session::register(
        store.get_ref(),
        codec.get_ref(),
        &name,
        &email,
        &form.password,
        Utc::now(),
    )
    .await?;

    Ok(HttpResponse::Created()
        .cookie(refresh_cookie(
            tokens.refresh_token,
            codec.ttl_seconds(TokenKind::Refresh),
        ))
        .json(AuthResponse {
            user_id: tokens.user_id,
            access_token: tokens.access_token,
            token_type: "Bearer".to_string(),
            expires_in: codec.ttl_seconds(TokenKind::Access),
        }))
}

/// POST /auth/login
///
/// Unknown email and wrong password answer identically: 401 with the same
/// body, so the endpoint cannot be used to enumerate accounts.
pub async fn login(
    form: web::Json<LoginRequest>,
    store: web::Data<PgUserStore>,
    codec: web::Data<TokenCodec>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    if form.password.is_empty() {
        return Err(ValidationError::EmptyField("password").into());
    }

    let tokens = session::login(
        store.get_ref(),
        codec.get_ref(),
        &email,
        &form.password,
        Utc::now(),
    )
    .await?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(
            tokens.refresh_token,
            codec.ttl_seconds(TokenKind::Refresh),
        ))
        .json(AuthResponse {
            user_id: tokens.user_id,
            access_token: tokens.access_token,
            token_type: "Bearer".to_string(),
            expires_in: codec.ttl_seconds(TokenKind::Access),
        }))
}

/// POST /auth/refresh
///
/// Reads the refresh token from its cookie and answers with a new access
/// token. The refresh cookie is not reissued.
pub async fn refresh(
    req: HttpRequest,
    codec: web::Data<TokenCodec>,
) -> Result<HttpResponse, AppError> {
    let cookie = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .ok_or(AppError::Auth(AuthError::MissingToken))?;

    let access_token = session::refresh(codec.get_ref(), cookie.value(), Utc::now())?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: codec.ttl_seconds(TokenKind::Access),
    }))
}

/// POST /auth/logout
///
/// Stateless logout: instructs the client to drop the refresh cookie.
/// Nothing is revoked server-side — an already-issued refresh token stays
/// valid until its natural expiry. Succeeds whether or not a session
/// existed.
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(serde_json::json!({ "message": "logged out" }))
}

/// GET /auth/me
///
/// Identity check for the bearer of a valid access token. Claims are
/// injected by the access guard.
pub async fn current_user(
    claims: web::ReqData<AccessClaims>,
    store: web::Data<PgUserStore>,
) -> Result<HttpResponse, AppError> {
    let user = store
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::Database(DatabaseError::NotFound("user")))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        user_id: user.user_id,
        name: user.user_name,
        email: user.user_email,
        created_at: user.created_at.to_rfc3339(),
    }))
}

//! Token issuance and parsing.
//!
//! Two token kinds exist, each with its own HMAC-SHA256 secret and expiry.
//! A token signed under one kind's secret fails signature verification when
//! parsed under the other, so an access-signing secret leak cannot be used
//! to forge refresh tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{AccessClaims, Claims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Internal parse/issue failure. Collapsed to a single 401 at the Access
/// Guard and Session Refresher boundaries; the concrete kind is only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token cannot be decoded into the expected shape
    Malformed,
    /// Signature mismatch, including cross-kind misuse and tampering
    InvalidSignature,
    /// Past its expiration time
    Expired,
    /// Token could not be built (should not happen with valid settings)
    Signing(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "token is structurally invalid"),
            TokenError::InvalidSignature => write!(f, "token signature mismatch"),
            TokenError::Expired => write!(f, "token has expired"),
            TokenError::Signing(msg) => write!(f, "token signing failed: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::Auth(AuthError::TokenExpired),
            TokenError::Malformed | TokenError::InvalidSignature => {
                AppError::Auth(AuthError::TokenInvalid)
            }
            TokenError::Signing(msg) => AppError::Internal(msg),
        }
    }
}

#[derive(Clone)]
struct KindConfig {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl KindConfig {
    fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }
}

/// Builds and parses signed tokens. Keys are derived once at startup from
/// the validated settings and never mutated, so a codec can be shared
/// freely across request handlers.
#[derive(Clone)]
pub struct TokenCodec {
    access: KindConfig,
    refresh: KindConfig,
}

impl TokenCodec {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            access: KindConfig::new(&settings.access_secret, settings.access_token_expiry),
            refresh: KindConfig::new(&settings.refresh_secret, settings.refresh_token_expiry),
        }
    }

    fn kind_config(&self, kind: TokenKind) -> &KindConfig {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn ttl_seconds(&self, kind: TokenKind) -> i64 {
        self.kind_config(kind).ttl_seconds
    }

    /// Issue a signed token of the given kind for `user_id`, valid from
    /// `now` until `now + ttl`. Pure function of inputs plus the secret.
    pub fn issue(
        &self,
        user_id: i64,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let config = self.kind_config(kind);
        let iat = now.timestamp();
        let exp = iat + config.ttl_seconds;
        let header = Header::new(Algorithm::HS256);

        let encoded = match kind {
            TokenKind::Access => encode(
                &header,
                &AccessClaims { sub: user_id, iat, exp },
                &config.encoding,
            ),
            TokenKind::Refresh => encode(
                &header,
                &RefreshClaims { sub: user_id, iat, exp },
                &config.encoding,
            ),
        };

        encoded.map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify the signature under the kind's secret and check expiry
    /// against the caller-supplied clock.
    pub fn parse(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        let config = self.kind_config(kind);

        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked below against `now`, not the system clock
        validation.validate_exp = false;

        let claims = match kind {
            TokenKind::Access => decode::<AccessClaims>(token, &config.decoding, &validation)
                .map(|data| Claims::Access(data.claims))?,
            TokenKind::Refresh => decode::<RefreshClaims>(token, &config.decoding, &validation)
                .map(|data| Claims::Refresh(data.claims))?,
        };

        if now.timestamp() >= claims.expires_at() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn codec() -> TokenCodec {
        TokenCodec::new(&JwtSettings {
            access_secret: "test-access-secret-key-1234567890".to_string(),
            access_token_expiry: 900,
            refresh_secret: "test-refresh-secret-key-0987654321".to_string(),
            refresh_token_expiry: 86400,
        })
    }

    #[test]
    fn issued_access_token_parses_back_to_subject() {
        let codec = codec();
        let now = Utc::now();

        let token = codec.issue(42, TokenKind::Access, now).unwrap();
        let claims = codec.parse(&token, TokenKind::Access, now).unwrap();

        assert_eq!(claims.subject(), 42);
        assert_eq!(claims.issued_at(), now.timestamp());
        assert_eq!(claims.expires_at(), now.timestamp() + 900);
        assert!(matches!(claims, Claims::Access(_)));
    }

    #[test]
    fn issued_refresh_token_parses_back_to_subject() {
        let codec = codec();
        let now = Utc::now();

        let token = codec.issue(42, TokenKind::Refresh, now).unwrap();
        let claims = codec.parse(&token, TokenKind::Refresh, now).unwrap();

        assert_eq!(claims.subject(), 42);
        assert_eq!(claims.expires_at(), now.timestamp() + 86400);
        assert!(matches!(claims, Claims::Refresh(_)));
    }

    #[test]
    fn token_expires_after_its_ttl() {
        let codec = codec();
        let issued_at = Utc::now();

        let token = codec.issue(42, TokenKind::Access, issued_at).unwrap();

        let just_before = issued_at + Duration::seconds(899);
        assert!(codec.parse(&token, TokenKind::Access, just_before).is_ok());

        let at_expiry = issued_at + Duration::seconds(900);
        assert_eq!(
            codec.parse(&token, TokenKind::Access, at_expiry),
            Err(TokenError::Expired)
        );

        let well_after = issued_at + Duration::hours(2);
        assert_eq!(
            codec.parse(&token, TokenKind::Access, well_after),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let codec = codec();
        let now = Utc::now();

        let refresh = codec.issue(42, TokenKind::Refresh, now).unwrap();
        assert_eq!(
            codec.parse(&refresh, TokenKind::Access, now),
            Err(TokenError::InvalidSignature)
        );

        let access = codec.issue(42, TokenKind::Access, now).unwrap();
        assert_eq!(
            codec.parse(&access, TokenKind::Refresh, now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_payload_fails_signature_check() {
        let codec = codec();
        let now = Utc::now();

        let token = codec.issue(42, TokenKind::Access, now).unwrap();
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        parts[1] = format!("{}AA", parts[1]);
        let tampered = parts.join(".");

        assert_eq!(
            codec.parse(&tampered, TokenKind::Access, now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_input_is_malformed() {
        let codec = codec();
        let now = Utc::now();

        assert_eq!(
            codec.parse("not.a.token", TokenKind::Access, now),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            codec.parse("", TokenKind::Access, now),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            codec.parse("justonechunk", TokenKind::Refresh, now),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn expired_maps_to_401_expired_kind() {
        let err: AppError = TokenError::Expired.into();
        assert!(matches!(err, AppError::Auth(AuthError::TokenExpired)));

        let err: AppError = TokenError::InvalidSignature.into();
        assert!(matches!(err, AppError::Auth(AuthError::TokenInvalid)));

        let err: AppError = TokenError::Malformed.into();
        assert!(matches!(err, AppError::Auth(AuthError::TokenInvalid)));
    }
}

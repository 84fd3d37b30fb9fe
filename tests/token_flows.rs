//! Token refresh, logout, and access-guard behavior over HTTP.
//!
//! These flows are stateless: the pool is built lazily and storage is never
//! touched, so the suite runs without a database.

use chrono::{Duration, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use synk_gateway::auth::{Claims, TokenCodec, TokenKind};
use synk_gateway::configuration::get_configuration;
use synk_gateway::startup::run;

struct TestApp {
    address: String,
    codec: TokenCodec,
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let configuration = get_configuration().expect("Failed to read configuration.");
    let pool = PgPoolOptions::new()
        .connect_lazy(&configuration.database.connection_string())
        .expect("Failed to build lazy pool");

    let codec = TokenCodec::new(&configuration.jwt);
    let server = run(listener, pool, configuration.jwt.clone()).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp { address, codec }
}

#[tokio::test]
async fn refresh_issues_a_new_access_token_for_the_cookie_subject() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    let refresh_token = app.codec.issue(42, TokenKind::Refresh, Utc::now()).unwrap();

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .header("Cookie", format!("refresh_token={}", refresh_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    // no rotation: the server must not reissue the refresh cookie
    assert!(response
        .headers()
        .get_all("set-cookie")
        .iter()
        .all(|h| !h.to_str().unwrap_or("").starts_with("refresh_token=")));

    let body: Value = response.json().await.expect("Failed to parse response");
    let access_token = body["access_token"].as_str().expect("No access token");

    let claims = app
        .codec
        .parse(access_token, TokenKind::Access, Utc::now())
        .expect("Returned access token should be valid");
    assert!(matches!(claims, Claims::Access(_)));
    assert_eq!(claims.subject(), 42);
}

#[tokio::test]
async fn refresh_requires_the_cookie() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/refresh", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn refresh_rejects_access_tokens_expired_tokens_and_tampering() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    let access_token = app.codec.issue(42, TokenKind::Access, Utc::now()).unwrap();
    let expired = app
        .codec
        .issue(42, TokenKind::Refresh, Utc::now() - Duration::hours(25))
        .unwrap();
    let valid = app.codec.issue(42, TokenKind::Refresh, Utc::now()).unwrap();
    let tampered = format!("{}X", valid);

    for (token, reason) in [
        (access_token, "access token in the refresh cookie"),
        (expired, "expired refresh token"),
        (tampered, "tampered refresh token"),
        ("garbage.token.value".to_string(), "malformed token"),
    ] {
        let response = client
            .post(&format!("{}/auth/refresh", &app.address))
            .header("Cookie", format!("refresh_token={}", token))
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            401,
            response.status().as_u16(),
            "Should reject {}",
            reason
        );

        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["code"], "UNAUTHORIZED", "Collapsed code for {}", reason);
    }
}

#[tokio::test]
async fn logout_always_instructs_cookie_deletion() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/logout", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let removal = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|h| h.starts_with("refresh_token="))
        .expect("Logout response did not clear the refresh cookie");

    // empty value, already expired
    assert!(removal.starts_with("refresh_token=;"));
    assert!(removal.contains("Max-Age=0"));
}

#[tokio::test]
async fn protected_route_returns_401_without_token() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/auth/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn protected_route_rejects_malformed_authorization_headers() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    let malformed_headers = vec![
        "Bearer",             // missing token
        "Basic dXNlcjpwYXNz", // not Bearer
        "BearerToken",        // missing space
        "Bearer invalid.token.here",
    ];

    for header in malformed_headers {
        let response = client
            .get(&format!("{}/auth/me", &app.address))
            .header("Authorization", header)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            401,
            response.status().as_u16(),
            "Should reject header: {}",
            header
        );
    }
}

#[tokio::test]
async fn protected_route_rejects_expired_and_cross_kind_tokens() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    let expired = app
        .codec
        .issue(42, TokenKind::Access, Utc::now() - Duration::hours(1))
        .unwrap();
    let refresh = app.codec.issue(42, TokenKind::Refresh, Utc::now()).unwrap();

    for (token, reason) in [(expired, "expired access token"), (refresh, "refresh token")] {
        let response = client
            .get(&format!("{}/auth/me", &app.address))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(401, response.status().as_u16(), "Should reject {}", reason);

        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["code"], "UNAUTHORIZED", "Collapsed code for {}", reason);
    }
}

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
}

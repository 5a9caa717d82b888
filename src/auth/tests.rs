//! Tests for the auth module

use super::*;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_no_auth() {
    let auth = Authenticator::new(AuthConfig::None);
    let client = reqwest::Client::new();
    let req = client.get("https://example.com/api");

    let built = auth.apply(req).await.unwrap().build().unwrap();
    assert!(built.headers().get("Authorization").is_none());
}

#[tokio::test]
async fn test_bearer_auth() {
    let auth = Authenticator::new(AuthConfig::Bearer {
        token: "static-token".to_string(),
    });

    let client = reqwest::Client::new();
    let req = client.get("https://example.com/api");
    let built = auth.apply(req).await.unwrap().build().unwrap();

    assert_eq!(
        built.headers().get("Authorization").unwrap(),
        "Bearer static-token"
    );
}

#[tokio::test]
async fn test_oauth2_refresh_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("authorization", "Basic Y2lkOmNzZWNyZXQ="))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=my-refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "refreshed-token",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthConfig::Oauth2Refresh {
        token_url: format!("{}/oauth/token", mock_server.uri()),
        client_id: "cid".to_string(),
        client_secret: "csecret".to_string(),
        refresh_token: "my-refresh-token".to_string(),
    });

    let client = reqwest::Client::new();
    let req = client.get("https://example.com/api");
    let built = auth.apply(req).await.unwrap().build().unwrap();

    assert_eq!(
        built.headers().get("Authorization").unwrap(),
        "Bearer refreshed-token"
    );
}

#[tokio::test]
async fn test_oauth2_token_caching() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "cached-token",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthConfig::Oauth2Refresh {
        token_url: format!("{}/oauth/token", mock_server.uri()),
        client_id: "cid".to_string(),
        client_secret: "csecret".to_string(),
        refresh_token: "rt".to_string(),
    });

    let client = reqwest::Client::new();
    for _ in 0..3 {
        let req = client.get("https://example.com/api");
        let _ = auth.apply(req).await.unwrap();
    }
}

#[tokio::test]
async fn test_oauth2_rotated_refresh_token_is_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access",
            "refresh_token": "rotated",
            "expires_in": 3600
        })))
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthConfig::Oauth2Refresh {
        token_url: format!("{}/oauth/token", mock_server.uri()),
        client_id: "cid".to_string(),
        client_secret: "csecret".to_string(),
        refresh_token: "original".to_string(),
    });

    assert_eq!(auth.current_refresh_token().await.as_deref(), Some("original"));

    let client = reqwest::Client::new();
    let _ = auth.apply(client.get("https://example.com/api")).await.unwrap();

    assert_eq!(auth.current_refresh_token().await.as_deref(), Some("rotated"));
}

#[tokio::test]
async fn test_clear_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "token",
            "expires_in": 3600
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthConfig::Oauth2Refresh {
        token_url: format!("{}/oauth/token", mock_server.uri()),
        client_id: "cid".to_string(),
        client_secret: "csecret".to_string(),
        refresh_token: "rt".to_string(),
    });

    let client = reqwest::Client::new();
    let _ = auth.apply(client.get("https://example.com/api")).await.unwrap();
    auth.clear_cache().await;
    let _ = auth.apply(client.get("https://example.com/api")).await.unwrap();
}

#[tokio::test]
async fn test_oauth2_error_handling() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthConfig::Oauth2Refresh {
        token_url: format!("{}/oauth/token", mock_server.uri()),
        client_id: "cid".to_string(),
        client_secret: "csecret".to_string(),
        refresh_token: "expired".to_string(),
    });

    let client = reqwest::Client::new();
    let err = auth
        .apply(client.get("https://example.com/api"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), crate::error::ErrorKind::Auth);
    let msg = err.to_string();
    assert!(msg.contains("401"));
    assert!(msg.contains("invalid_grant"));
}

#[tokio::test]
async fn test_jwt_app_token() {
    let auth = Authenticator::new(AuthConfig::Jwt {
        api_key: "my-key".to_string(),
        api_secret: "my-secret".to_string(),
        token_lifetime_seconds: DEFAULT_JWT_LIFETIME_SECONDS,
    });

    let client = reqwest::Client::new();
    let built = auth
        .apply(client.get("https://example.com/api"))
        .await
        .unwrap()
        .build()
        .unwrap();

    let value = built
        .headers()
        .get("Authorization")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let token = value.strip_prefix("Bearer ").unwrap();

    let decoded = decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(b"my-secret"),
        &Validation::new(Algorithm::HS256),
    )
    .unwrap();

    assert_eq!(decoded.header.alg, Algorithm::HS256);
    assert_eq!(decoded.claims["iss"], "my-key");
    let iat = decoded.claims["iat"].as_i64().unwrap();
    let exp = decoded.claims["exp"].as_i64().unwrap();
    assert_eq!(exp - iat, 3600);
}

#[tokio::test]
async fn test_jwt_token_is_cached() {
    let auth = Authenticator::new(AuthConfig::Jwt {
        api_key: "k".to_string(),
        api_secret: "s".to_string(),
        token_lifetime_seconds: 600,
    });

    let client = reqwest::Client::new();
    let first = auth
        .apply(client.get("https://example.com/a"))
        .await
        .unwrap()
        .build()
        .unwrap();
    let second = auth
        .apply(client.get("https://example.com/b"))
        .await
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(
        first.headers().get("Authorization"),
        second.headers().get("Authorization")
    );
}

//! Authenticator implementation
//!
//! Handles applying authentication to requests and managing token refresh.

use super::types::{AuthConfig, CachedToken};
use crate::error::{Error, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Authenticator handles applying authentication to HTTP requests
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
    /// Cached token for OAuth2/JWT auth
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// Latest refresh token; the token endpoint may rotate it
    refresh_token: Arc<RwLock<Option<String>>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(config: AuthConfig, http_client: Client) -> Self {
        let refresh_token = match &config {
            AuthConfig::Oauth2Refresh { refresh_token, .. } => Some(refresh_token.clone()),
            _ => None,
        };
        Self {
            config,
            cached_token: Arc::new(RwLock::new(None)),
            refresh_token: Arc::new(RwLock::new(refresh_token)),
            http_client,
        }
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        match &self.config {
            AuthConfig::None => Ok(req),

            AuthConfig::Bearer { token } => Ok(req.bearer_auth(token)),

            AuthConfig::Oauth2Refresh { .. } | AuthConfig::Jwt { .. } => {
                let token = self.get_or_refresh_token().await?;
                Ok(req.bearer_auth(token))
            }
        }
    }

    /// Get a valid token, refreshing if necessary
    async fn get_or_refresh_token(&self) -> Result<String> {
        // Check if we have a valid cached token
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        // Need to refresh - acquire write lock
        let mut cached = self.cached_token.write().await;

        // Double-check after acquiring write lock (another task might have refreshed)
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let new_token = self.fetch_new_token().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Fetch a new token based on auth type
    async fn fetch_new_token(&self) -> Result<CachedToken> {
        match &self.config {
            AuthConfig::Oauth2Refresh {
                token_url,
                client_id,
                client_secret,
                ..
            } => {
                self.fetch_oauth2_refresh(token_url, client_id, client_secret)
                    .await
            }

            AuthConfig::Jwt {
                api_key,
                api_secret,
                token_lifetime_seconds,
            } => generate_jwt(api_key, api_secret, *token_lifetime_seconds),

            _ => Err(Error::auth(
                "Token refresh not supported for this auth type",
            )),
        }
    }

    /// Exchange the refresh token for an access token
    async fn fetch_oauth2_refresh(
        &self,
        token_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<CachedToken> {
        let refresh_token = self
            .refresh_token
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::TokenRefresh {
                message: "No refresh token available".to_string(),
            })?;

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];

        debug!(token_url, "Refreshing OAuth2 access token");

        let response = self
            .http_client
            .post(token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenRefresh {
                message: format!("Refresh token request failed with status {status}: {body}"),
            });
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
        if let Some(rotated) = &token_response.refresh_token {
            *self.refresh_token.write().await = Some(rotated.clone());
        }
        Ok(token_response.into_cached_token())
    }

    /// The refresh token currently in use, if any
    pub async fn current_refresh_token(&self) -> Option<String> {
        self.refresh_token.read().await.clone()
    }

    /// Clear the cached token (useful for testing or forced refresh)
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    /// Get the current auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

/// Mint an HS256 JWT for a JWT app and use it directly as the bearer token
fn generate_jwt(api_key: &str, api_secret: &str, lifetime_seconds: u64) -> Result<CachedToken> {
    let now = Utc::now().timestamp();
    #[allow(clippy::cast_possible_wrap)]
    let lifetime = lifetime_seconds as i64;

    let claims = JwtClaims {
        iss: api_key.to_string(),
        iat: now,
        exp: now + lifetime,
    };

    let encoding_key = EncodingKey::from_secret(api_secret.as_bytes());
    let jwt = encode(&Header::new(Algorithm::HS256), &claims, &encoding_key).map_err(|e| {
        Error::JwtGeneration {
            message: format!("Failed to encode JWT: {e}"),
        }
    })?;

    Ok(CachedToken::expires_in(jwt, lifetime))
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct JwtClaims {
    pub(crate) iss: String,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

//! Tap configuration
//!
//! The JSON config file handed to the tap with `--config`. It carries the
//! API base URL, credentials and HTTP tuning, and resolves into an
//! [`HttpClientConfig`] and an [`AuthConfig`].

use crate::auth::{AuthConfig, DEFAULT_JWT_LIFETIME_SECONDS};
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::types::JsonObject;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default Zoom API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.zoom.us/v2";

/// Default OAuth token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://zoom.us/oauth/token";

/// Tap configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TapConfig {
    /// API base URL (falls back to the graph's, then the Zoom default)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Static bearer token
    #[serde(default)]
    pub access_token: Option<String>,

    /// Pre-minted JWT, used as a bearer token
    #[serde(default)]
    pub jwt: Option<String>,

    /// OAuth client ID
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[serde(default)]
    pub client_secret: Option<String>,

    /// OAuth refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// OAuth token endpoint
    #[serde(default)]
    pub token_url: Option<String>,

    /// JWT app key
    #[serde(default)]
    pub api_key: Option<String>,

    /// JWT app secret
    #[serde(default)]
    pub api_secret: Option<String>,

    /// Lifetime of locally minted JWTs
    #[serde(default)]
    pub jwt_lifetime_secs: Option<u64>,

    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Retries for retryable failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Client-side request rate limit
    #[serde(default)]
    pub rate_limit_rps: Option<u32>,

    /// Page size requested on each endpoint's first page
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Keys this tap does not interpret
    #[serde(flatten)]
    pub extra: JsonObject,
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Treat blank strings as unset
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl TapConfig {
    /// Parse a config from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Failed to parse tap config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Check numeric settings
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::InvalidConfigValue {
                field: "page_size".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidConfigValue {
                field: "request_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.rate_limit_rps == Some(0) {
            return Err(Error::InvalidConfigValue {
                field: "rate_limit_rps".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if let Some(base_url) = present(&self.base_url) {
            let parsed = Url::parse(base_url)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::InvalidConfigValue {
                    field: "base_url".to_string(),
                    message: format!("unsupported scheme '{}'", parsed.scheme()),
                });
            }
        }
        Ok(())
    }

    /// Base URL, preferring the config over `graph_default`
    pub fn resolve_base_url(&self, graph_default: Option<&str>) -> String {
        present(&self.base_url)
            .or(graph_default)
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string()
    }

    /// HTTP client settings
    pub fn http_config(&self, graph_default: Option<&str>) -> HttpClientConfig {
        let mut config = HttpClientConfig::new()
            .with_base_url(self.resolve_base_url(graph_default))
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_max_retries(self.max_retries);

        config = match self.rate_limit_rps {
            Some(rps) => config.with_rate_limit(RateLimiterConfig::per_second(rps)),
            None => config.without_rate_limit(),
        };
        if let Some(agent) = present(&self.user_agent) {
            config = config.with_user_agent(agent);
        }
        config
    }

    /// Credentials, in order of preference: static token, OAuth refresh,
    /// JWT app.
    pub fn auth_config(&self) -> Result<AuthConfig> {
        if let Some(token) = present(&self.access_token).or(present(&self.jwt)) {
            return Ok(AuthConfig::Bearer {
                token: token.to_string(),
            });
        }

        if let Some(refresh_token) = present(&self.refresh_token) {
            let client_id =
                present(&self.client_id).ok_or_else(|| Error::missing_field("client_id"))?;
            let client_secret = present(&self.client_secret)
                .ok_or_else(|| Error::missing_field("client_secret"))?;
            return Ok(AuthConfig::Oauth2Refresh {
                token_url: present(&self.token_url)
                    .unwrap_or(DEFAULT_TOKEN_URL)
                    .to_string(),
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
                refresh_token: refresh_token.to_string(),
            });
        }

        if let Some(api_key) = present(&self.api_key) {
            let api_secret =
                present(&self.api_secret).ok_or_else(|| Error::missing_field("api_secret"))?;
            return Ok(AuthConfig::Jwt {
                api_key: api_key.to_string(),
                api_secret: api_secret.to_string(),
                token_lifetime_seconds: self
                    .jwt_lifetime_secs
                    .unwrap_or(DEFAULT_JWT_LIFETIME_SECONDS),
            });
        }

        Err(Error::missing_field(
            "access_token (or refresh_token, or api_key)",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = TapConfig::from_json(r#"{"access_token": "t"}"#).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.resolve_base_url(None), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_base_url_precedence() {
        let config = TapConfig::from_json(r#"{"base_url": "http://localhost:9000"}"#).unwrap();
        assert_eq!(
            config.resolve_base_url(Some("https://graph.example")),
            "http://localhost:9000"
        );

        let config = TapConfig::from_json("{}").unwrap();
        assert_eq!(
            config.resolve_base_url(Some("https://graph.example")),
            "https://graph.example"
        );
    }

    #[test]
    fn test_bearer_auth() {
        let config = TapConfig::from_json(r#"{"access_token": "abc"}"#).unwrap();
        assert!(matches!(config.auth_config().unwrap(), AuthConfig::Bearer { token } if token == "abc"));

        let config = TapConfig::from_json(r#"{"jwt": "xyz"}"#).unwrap();
        assert!(matches!(config.auth_config().unwrap(), AuthConfig::Bearer { token } if token == "xyz"));
    }

    #[test]
    fn test_oauth_refresh_auth() {
        let config = TapConfig::from_json(
            &json!({
                "client_id": "cid",
                "client_secret": "secret",
                "refresh_token": "rt"
            })
            .to_string(),
        )
        .unwrap();

        match config.auth_config().unwrap() {
            AuthConfig::Oauth2Refresh {
                token_url,
                client_id,
                refresh_token,
                ..
            } => {
                assert_eq!(token_url, DEFAULT_TOKEN_URL);
                assert_eq!(client_id, "cid");
                assert_eq!(refresh_token, "rt");
            }
            other => panic!("unexpected auth: {other:?}"),
        }
    }

    #[test]
    fn test_oauth_missing_secret() {
        let config =
            TapConfig::from_json(r#"{"client_id": "cid", "refresh_token": "rt"}"#).unwrap();
        let err = config.auth_config().unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { field } if field == "client_secret"));
    }

    #[test]
    fn test_jwt_app_auth() {
        let config =
            TapConfig::from_json(r#"{"api_key": "key", "api_secret": "shh"}"#).unwrap();
        match config.auth_config().unwrap() {
            AuthConfig::Jwt {
                api_key,
                token_lifetime_seconds,
                ..
            } => {
                assert_eq!(api_key, "key");
                assert_eq!(token_lifetime_seconds, DEFAULT_JWT_LIFETIME_SECONDS);
            }
            other => panic!("unexpected auth: {other:?}"),
        }
    }

    #[test]
    fn test_blank_credentials_are_missing() {
        let config = TapConfig::from_json(r#"{"access_token": "  "}"#).unwrap();
        assert!(matches!(
            config.auth_config().unwrap_err(),
            Error::MissingConfigField { .. }
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(TapConfig::from_json(r#"{"page_size": 0}"#).is_err());
        assert!(TapConfig::from_json(r#"{"request_timeout_secs": 0}"#).is_err());
        assert!(TapConfig::from_json(r#"{"rate_limit_rps": 0}"#).is_err());
        assert!(TapConfig::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_base_url_is_validated() {
        let err = TapConfig::from_json(r#"{"base_url": "not a url"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);

        let err = TapConfig::from_json(r#"{"base_url": "ftp://api.zoom.us/v2"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "base_url"));

        assert!(TapConfig::from_json(r#"{"base_url": "  "}"#).is_ok());
    }

    #[test]
    fn test_http_config() {
        let config = TapConfig::from_json(
            r#"{"request_timeout_secs": 5, "max_retries": 1, "rate_limit_rps": 10, "user_agent": "me"}"#,
        )
        .unwrap();
        let http = config.http_config(None);

        assert_eq!(http.base_url.as_deref(), Some(DEFAULT_BASE_URL));
        assert_eq!(http.timeout, Duration::from_secs(5));
        assert_eq!(http.retry.max_retries, 1);
        assert_eq!(http.rate_limit, Some(RateLimiterConfig::per_second(10)));
        assert_eq!(http.user_agent, "me");
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let config = TapConfig::from_json(r#"{"start_date": "2024-01-01"}"#).unwrap();
        assert_eq!(config.extra["start_date"], json!("2024-01-01"));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"access_token": "t"}"#).unwrap();
        assert!(TapConfig::from_path(&path).is_ok());
        assert!(TapConfig::from_path(dir.path().join("missing.json")).is_err());
    }
}

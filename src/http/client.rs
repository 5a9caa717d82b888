//! HTTP client for the Zoom API
//!
//! Every call is a GET tagged with the stream it serves. Each response is
//! sorted into a page, "nothing to sync" (404, 204, an empty or `null`
//! body), a failure worth retrying, or a fatal error. Retryable failures
//! are retried with backoff until the retry budget runs out.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use crate::source::PageSource;
use crate::types::{BackoffType, JsonValue};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Default user agent
pub const DEFAULT_USER_AGENT: &str = concat!("tap-zoom/", env!("CARGO_PKG_VERSION"));

/// Wait applied to a 429 without a usable `Retry-After` header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

// ============================================================================
// Configuration
// ============================================================================

/// Retry budget and the backoff between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// How the delay grows between retries
    pub backoff: BackoffType,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on any delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffType::Exponential,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt`, counting from zero
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            BackoffType::Constant => self.initial_delay,
            BackoffType::Linear => self.initial_delay.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => self
                .initial_delay
                .saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.max_delay)
    }
}

/// Settings for [`HttpClient`]
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Prefix joined to every relative path
    pub base_url: Option<String>,
    /// Timeout of a single attempt
    pub timeout: Duration,
    /// Retry budget and backoff
    pub retry: RetryPolicy,
    /// Client-side request rate, `None` to disable
    pub rate_limit: Option<RateLimiterConfig>,
    /// `User-Agent` header
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: Some(RateLimiterConfig::default()),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientConfig {
    /// Default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of retries
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.retry.max_retries = retries;
        self
    }

    /// Set the backoff between retries
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffType, initial: Duration, max: Duration) -> Self {
        self.retry.backoff = backoff;
        self.retry.initial_delay = initial;
        self.retry.max_delay = max;
        self
    }

    /// Limit the request rate
    #[must_use]
    pub fn with_rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }

    /// Disable client-side rate limiting
    #[must_use]
    pub fn without_rate_limit(mut self) -> Self {
        self.rate_limit = None;
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

// ============================================================================
// Client
// ============================================================================

/// What one attempt produced
enum Outcome {
    /// A page, or `None` when there is nothing to sync
    Page(Option<JsonValue>),
    /// A transient failure; `wait` overrides the backoff delay
    Retry { error: Error, wait: Option<Duration> },
}

/// Authenticated, rate-limited GET client
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Client with default settings and no credentials
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Client with custom settings and no credentials
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(Error::Http)?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            authenticator: None,
            rate_limiter,
        })
    }

    /// Client that authenticates every request
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.authenticator = Some(Authenticator::with_client(
            auth_config,
            client.client.clone(),
        ));
        Ok(client)
    }

    /// The authenticator, if one is configured
    pub fn authenticator(&self) -> Option<&Authenticator> {
        self.authenticator.as_ref()
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Settings this client was built with
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// GET `path` on behalf of `stream`.
    ///
    /// Returns `Ok(None)` when the server has nothing for this path.
    /// Rate limits, 5xx replies, timeouts and connection failures are
    /// retried; the last failure is returned once retries run out.
    pub async fn get_page(
        &self,
        path: &str,
        query: &[(String, String)],
        stream: &str,
    ) -> Result<Option<JsonValue>> {
        let url = self.build_url(path);
        let retry = &self.config.retry;
        let mut attempt = 0;

        loop {
            let outcome = match self.send(&url, query).await {
                Ok(response) => classify(response, stream).await?,
                Err(Error::Http(e)) if e.is_timeout() => Outcome::Retry {
                    error: Error::Timeout {
                        timeout_ms: u64::try_from(self.config.timeout.as_millis())
                            .unwrap_or(u64::MAX),
                    },
                    wait: None,
                },
                Err(Error::Http(e)) if e.is_connect() => Outcome::Retry {
                    error: Error::Http(e),
                    wait: None,
                },
                Err(e) => return Err(e),
            };

            match outcome {
                Outcome::Page(page) => return Ok(page),
                Outcome::Retry { error, .. } if attempt >= retry.max_retries => return Err(error),
                Outcome::Retry { error, wait } => {
                    let wait = wait.unwrap_or_else(|| retry.delay(attempt));
                    attempt += 1;
                    warn!(
                        stream,
                        url = %url,
                        attempt,
                        max_attempts = retry.max_retries + 1,
                        "{error}, retrying in {wait:?}"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// One attempt: throttle, authenticate, send
    async fn send(&self, url: &str, query: &[(String, String)]) -> Result<Response> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }

        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(auth) = &self.authenticator {
            request = auth.apply(request).await?;
        }
        request.send().await.map_err(Error::Http)
    }

    /// Join a relative path onto the base URL; absolute URLs pass through
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        }
    }
}

/// Sort a response into a page, a retry, or an error
async fn classify(response: Response, stream: &str) -> Result<Outcome> {
    let status = response.status();

    match status {
        StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => {
            debug!(stream, status = status.as_u16(), "Nothing to sync");
            return Ok(Outcome::Page(None));
        }
        StatusCode::TOO_MANY_REQUESTS => {
            let seconds = retry_after(&response);
            return Ok(Outcome::Retry {
                error: Error::RateLimited {
                    retry_after_seconds: seconds,
                },
                wait: Some(Duration::from_secs(seconds)),
            });
        }
        _ => {}
    }

    let body = response.text().await.map_err(Error::Http)?;

    if !status.is_success() {
        let error = Error::http_status(status.as_u16(), body);
        return if error.is_retryable() {
            Ok(Outcome::Retry { error, wait: None })
        } else {
            Err(error)
        };
    }

    debug!(stream, status = status.as_u16(), bytes = body.len(), "Fetched");
    if body.trim().is_empty() {
        return Ok(Outcome::Page(None));
    }
    match serde_json::from_str(&body)? {
        JsonValue::Null => Ok(Outcome::Page(None)),
        value => Ok(Outcome::Page(Some(value))),
    }
}

/// Seconds from a `Retry-After` header
fn retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[async_trait]
impl PageSource for HttpClient {
    async fn fetch_page(
        &self,
        path: &str,
        params: &[(String, String)],
        stream: &str,
    ) -> Result<Option<JsonValue>> {
        self.get_page(path, params, stream).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_authenticator", &self.authenticator.is_some())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

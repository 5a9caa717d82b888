//! Error types for tap-zoom
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for tap-zoom
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Stream '{stream}' not found")]
    StreamNotFound { stream: String },

    #[error("Path of stream '{stream}' references unbound placeholder '{placeholder}'")]
    UnboundPlaceholder { stream: String, placeholder: String },

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    #[error("JWT generation failed: {message}")]
    JwtGeneration { message: String },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Record Errors
    // ============================================================================
    #[error("Record of stream '{stream}' has no field '{field}' to provide child keys")]
    KeyExtraction { stream: String, field: String },

    #[error("Failed to extract records of stream '{stream}' from key '{data_key}': {message}")]
    RecordExtraction {
        stream: String,
        data_key: String,
        message: String,
    },

    #[error("Record of stream '{stream}' failed validation at '{path}': {message}")]
    Validation {
        stream: String,
        path: String,
        message: String,
    },

    // ============================================================================
    // State and Output Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    #[error("Output error: {message}")]
    Output { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Control Flow
    // ============================================================================
    #[error("Sync cancelled while syncing '{stream}'")]
    Cancelled { stream: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of errors, used for reporting and exit handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed endpoint graph, tap config or catalog
    Configuration,
    /// Credentials could not be obtained
    Auth,
    /// Network or HTTP failure raised by the client
    Transport,
    /// A `provides` source field was missing on a record
    KeyExtraction,
    /// A record could not be extracted or coerced to its schema
    Validation,
    /// State could not be loaded or persisted
    State,
    /// Messages could not be written
    Output,
    /// The run was cancelled
    Cancelled,
    /// Anything else
    Other,
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a key extraction error
    pub fn key_extraction(stream: impl Into<String>, field: impl Into<String>) -> Self {
        Self::KeyExtraction {
            stream: stream.into(),
            field: field.into(),
        }
    }

    /// Create a record extraction error
    pub fn record_extraction(
        stream: impl Into<String>,
        data_key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::RecordExtraction {
            stream: stream.into(),
            data_key: data_key.into(),
            message: message.into(),
        }
    }

    /// Create an unbound placeholder error
    pub fn unbound_placeholder(stream: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self::UnboundPlaceholder {
            stream: stream.into(),
            placeholder: placeholder.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::InvalidConfigValue { .. }
            | Error::YamlParse(_)
            | Error::JsonParse(_)
            | Error::StreamNotFound { .. }
            | Error::UnboundPlaceholder { .. }
            | Error::InvalidUrl(_) => ErrorKind::Configuration,
            Error::Auth { .. } | Error::TokenRefresh { .. } | Error::JwtGeneration { .. } => {
                ErrorKind::Auth
            }
            Error::Http(_)
            | Error::HttpStatus { .. }
            | Error::RateLimited { .. }
            | Error::Timeout { .. } => ErrorKind::Transport,
            Error::KeyExtraction { .. } => ErrorKind::KeyExtraction,
            Error::RecordExtraction { .. } | Error::Validation { .. } => ErrorKind::Validation,
            Error::State { .. } => ErrorKind::State,
            Error::Output { .. } | Error::Io(_) => ErrorKind::Output,
            Error::Cancelled { .. } => ErrorKind::Cancelled,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for tap-zoom
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

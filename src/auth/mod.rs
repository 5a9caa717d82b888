//! Authentication module
//!
//! Supports: static Bearer token, OAuth2 refresh token, JWT app credentials
//!
//! The `Authenticator` handles all auth types and manages token caching
//! for auth types that require token refresh.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, CachedToken, DEFAULT_JWT_LIFETIME_SECONDS};

#[cfg(test)]
mod tests;

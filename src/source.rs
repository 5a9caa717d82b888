//! Page source abstraction
//!
//! The sync engine never talks to HTTP directly. It asks a [`PageSource`]
//! for one page at a time; [`crate::http::HttpClient`] is the production
//! implementation and tests script their own.

use crate::error::Result;
use crate::types::JsonValue;
use async_trait::async_trait;

/// Ordered query parameters for one page request
pub type QueryParams = Vec<(String, String)>;

/// Fetches one page of an endpoint
#[async_trait]
pub trait PageSource: Send + Sync {
    /// GET `path` with `params`, tagged with the `stream` being synced.
    ///
    /// `Ok(None)` means there is deliberately nothing to sync at this path;
    /// transport and auth failures are errors.
    async fn fetch_page(
        &self,
        path: &str,
        params: &[(String, String)],
        stream: &str,
    ) -> Result<Option<JsonValue>>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for std::sync::Arc<T> {
    async fn fetch_page(
        &self,
        path: &str,
        params: &[(String, String)],
        stream: &str,
    ) -> Result<Option<JsonValue>> {
        (**self).fetch_page(path, params, stream).await
    }
}

//! Pagination strategy implementations

use super::types::{
    read_count, NextPage, PaginationState, Paginator, PAGE_COUNT_FIELD, PAGE_SIZE_FIELD,
};
use crate::source::QueryParams;
use crate::types::JsonValue;
use tracing::debug;

// ============================================================================
// Page Count Pagination
// ============================================================================

/// Page number pagination driven by a server-reported page count.
///
/// Every request carries `page_size` and `page_number`. Another page is
/// requested while `page_number < page_count`; the server's `page_size`
/// replaces the requested one, since the server may clamp it.
/// A missing `page_count` means a single page and a missing `page_size`
/// keeps the previous size.
#[derive(Debug, Clone)]
pub struct PageCountPaginator {
    /// Query parameter name for page size
    pub page_size_param: String,
    /// Query parameter name for page number
    pub page_number_param: String,
    /// Response field holding the total page count
    pub page_count_field: String,
    /// Response field holding the effective page size
    pub page_size_field: String,
}

impl Default for PageCountPaginator {
    fn default() -> Self {
        Self {
            page_size_param: "page_size".to_string(),
            page_number_param: "page_number".to_string(),
            page_count_field: PAGE_COUNT_FIELD.to_string(),
            page_size_field: PAGE_SIZE_FIELD.to_string(),
        }
    }
}

impl PageCountPaginator {
    /// Create a paginator with the default parameter and field names
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the query parameter names
    #[must_use]
    pub fn with_params(
        mut self,
        page_size_param: impl Into<String>,
        page_number_param: impl Into<String>,
    ) -> Self {
        self.page_size_param = page_size_param.into();
        self.page_number_param = page_number_param.into();
        self
    }
}

impl Paginator for PageCountPaginator {
    fn params(&self, state: &PaginationState) -> QueryParams {
        page_params(&self.page_size_param, &self.page_number_param, state)
    }

    fn process_response(&self, body: &JsonValue, state: &mut PaginationState) -> NextPage {
        state.pages_fetched += 1;

        let page_count = read_count(body, &self.page_count_field).unwrap_or(1);
        if state.page_number >= page_count {
            state.mark_done();
            return NextPage::Done;
        }

        if let Some(size) = read_count(body, &self.page_size_field).filter(|s| *s > 0) {
            if size != state.page_size {
                debug!(
                    requested = state.page_size,
                    reported = size,
                    "Adopting server page size"
                );
            }
            state.page_size = size;
        }
        state.next_page();
        NextPage::Continue
    }
}

// ============================================================================
// Single Page
// ============================================================================

/// Fetches the first page only.
///
/// Used for endpoints with pagination disabled; the first request still
/// carries the page parameters.
#[derive(Debug, Clone, Default)]
pub struct SinglePagePaginator {
    inner: PageCountPaginator,
}

impl SinglePagePaginator {
    /// Create a single page paginator with the default parameter names
    pub fn new() -> Self {
        Self::default()
    }
}

impl Paginator for SinglePagePaginator {
    fn params(&self, state: &PaginationState) -> QueryParams {
        self.inner.params(state)
    }

    fn process_response(&self, _body: &JsonValue, state: &mut PaginationState) -> NextPage {
        state.pages_fetched += 1;
        state.mark_done();
        NextPage::Done
    }
}

/// Pick the strategy for an endpoint's `paginate` flag
pub fn paginator_for(paginate: bool) -> Box<dyn Paginator> {
    if paginate {
        Box::new(PageCountPaginator::new())
    } else {
        Box::new(SinglePagePaginator::new())
    }
}

fn page_params(size_param: &str, number_param: &str, state: &PaginationState) -> QueryParams {
    vec![
        (size_param.to_string(), state.page_size.to_string()),
        (number_param.to_string(), state.page_number.to_string()),
    ]
}

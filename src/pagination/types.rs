//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use crate::source::QueryParams;
use crate::types::JsonValue;

/// Page size requested before the server has reported one
pub const DEFAULT_PAGE_SIZE: u64 = 1000;

/// First page number
pub const FIRST_PAGE: u64 = 1;

/// Response field carrying the total page count
pub const PAGE_COUNT_FIELD: &str = "page_count";

/// Response field carrying the effective page size
pub const PAGE_SIZE_FIELD: &str = "page_size";

/// Result of the next page computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// Request another page with the updated state
    Continue,
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// Tracks pagination state for one endpoint request sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    /// Page size sent with the next request
    pub page_size: u64,
    /// Page number sent with the next request
    pub page_number: u64,
    /// Pages processed so far
    pub pages_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PaginationState {
    /// Start at the first page with the given page size
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size,
            page_number: FIRST_PAGE,
            pages_fetched: 0,
            done: false,
        }
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Advance to the next page
    pub fn next_page(&mut self) {
        self.page_number += 1;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Query parameters for the request described by `state`
    fn params(&self, state: &PaginationState) -> QueryParams;

    /// Process a response body and decide whether another page follows.
    ///
    /// On `Continue`, `state` already describes the next request.
    fn process_response(&self, body: &JsonValue, state: &mut PaginationState) -> NextPage;
}

/// Read a non-negative count from a response field.
///
/// Integers, integral floats and numeric strings are accepted; anything
/// else is treated as absent.
pub fn read_count(body: &JsonValue, field: &str) -> Option<u64> {
    match body.get(field)? {
        JsonValue::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && f.is_finite())
                .map(|f| f as u64)
        }),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

//! Pagination module
//!
//! Supports: page count driven page numbers, single page
//!
//! # Overview
//!
//! A paginator turns a [`PaginationState`] into query parameters and reads
//! each response to decide whether another page follows. The server's
//! reported page size and page count always win over what was requested.

mod strategies;
mod types;

pub use strategies::{paginator_for, PageCountPaginator, SinglePagePaginator};
pub use types::{
    read_count, NextPage, PaginationState, Paginator, DEFAULT_PAGE_SIZE, FIRST_PAGE,
    PAGE_COUNT_FIELD, PAGE_SIZE_FIELD,
};

//! Catalog module
//!
//! Discovery of stream schemas from the endpoint graph, and selection of
//! the streams a run emits.
//!
//! # Overview
//!
//! - [`discover`] builds a Singer catalog from the graph
//! - [`Catalog::selection`] reads stream selection from metadata
//! - [`CatalogEntry::excluded_fields`] lists fields metadata deselects

mod discover;
mod types;

pub use discover::discover;
pub use types::{
    Catalog, CatalogEntry, MetadataEntry, SelectionSet, INCLUSION, PARENT_TAP_STREAM_ID, SELECTED,
    SELECTED_BY_DEFAULT, TABLE_KEY_PROPERTIES,
};

#[cfg(test)]
mod tests;

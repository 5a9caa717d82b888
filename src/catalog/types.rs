//! Singer catalog types

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Metadata key: stream or field selection
pub const SELECTED: &str = "selected";
/// Metadata key: default selection when `selected` is absent
pub const SELECTED_BY_DEFAULT: &str = "selected-by-default";
/// Metadata key: field inclusion (`automatic`, `available`, `unsupported`)
pub const INCLUSION: &str = "inclusion";
/// Metadata key: primary key fields of the stream
pub const TABLE_KEY_PROPERTIES: &str = "table-key-properties";
/// Metadata key: the stream whose records feed this one
pub const PARENT_TAP_STREAM_ID: &str = "parent-tap-stream-id";

// ============================================================================
// Catalog
// ============================================================================

/// A Singer catalog: the stream schemas and selection metadata for a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// One entry per stream
    #[serde(default)]
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Parse a catalog from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid catalog: {e}")))
    }

    /// Read a catalog file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read catalog '{}': {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Look up an entry by stream name
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|e| e.tap_stream_id == stream || e.stream == stream)
    }

    /// Streams enabled for emission
    pub fn selection(&self) -> SelectionSet {
        self.streams
            .iter()
            .filter(|e| e.is_selected())
            .map(|e| e.tap_stream_id.clone())
            .collect()
    }

    /// Select exactly `names` and deselect every other stream
    pub fn select_only<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for name in names {
            if self.get(name.as_ref()).is_none() {
                return Err(Error::StreamNotFound {
                    stream: name.as_ref().to_string(),
                });
            }
        }

        for entry in &mut self.streams {
            let selected = names
                .iter()
                .any(|n| n.as_ref() == entry.tap_stream_id || n.as_ref() == entry.stream);
            entry.set_selected(selected);
        }
        Ok(())
    }

    /// Pretty JSON for `discover` output
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Catalog Entry
// ============================================================================

/// One stream of a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,
    /// Stream name
    pub stream: String,
    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,
    /// Stream schema
    pub schema: Schema,
    /// Breadcrumb metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

/// Metadata attached to a breadcrumb (`[]` for the stream itself,
/// `["properties", field]` for a field)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Path into the schema
    pub breadcrumb: Vec<String>,
    /// Metadata values
    pub metadata: JsonObject,
}

impl MetadataEntry {
    /// Stream-level metadata
    pub fn root(metadata: JsonObject) -> Self {
        Self {
            breadcrumb: Vec::new(),
            metadata,
        }
    }

    /// Field-level metadata
    pub fn property(field: impl Into<String>, metadata: JsonObject) -> Self {
        Self {
            breadcrumb: vec!["properties".to_string(), field.into()],
            metadata,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(JsonValue::as_bool)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(JsonValue::as_str)
    }
}

impl CatalogEntry {
    /// Stream-level metadata, if present
    pub fn root_metadata(&self) -> Option<&MetadataEntry> {
        self.metadata.iter().find(|m| m.breadcrumb.is_empty())
    }

    /// Whether the stream is selected: `selected`, else `selected-by-default`
    pub fn is_selected(&self) -> bool {
        self.root_metadata().is_some_and(|m| {
            m.get_bool(SELECTED)
                .or_else(|| m.get_bool(SELECTED_BY_DEFAULT))
                .unwrap_or(false)
        })
    }

    /// Set the stream-level `selected` flag
    pub fn set_selected(&mut self, selected: bool) {
        match self.metadata.iter_mut().find(|m| m.breadcrumb.is_empty()) {
            Some(root) => {
                root.metadata
                    .insert(SELECTED.to_string(), JsonValue::Bool(selected));
            }
            None => {
                let mut metadata = JsonObject::new();
                metadata.insert(SELECTED.to_string(), JsonValue::Bool(selected));
                self.metadata.insert(0, MetadataEntry::root(metadata));
            }
        }
    }

    /// Top-level fields to drop before transformation.
    ///
    /// A field is dropped when its inclusion is `unsupported`, or when it
    /// is deselected and its inclusion is not `automatic`.
    pub fn excluded_fields(&self) -> BTreeSet<String> {
        self.metadata
            .iter()
            .filter_map(|m| match m.breadcrumb.as_slice() {
                [properties, field] if properties == "properties" => Some((field, m)),
                _ => None,
            })
            .filter(|(_, m)| {
                let inclusion = m.get_str(INCLUSION);
                inclusion == Some("unsupported")
                    || (m.get_bool(SELECTED) == Some(false) && inclusion != Some("automatic"))
            })
            .map(|(field, _)| field.clone())
            .collect()
    }
}

// ============================================================================
// Selection Set
// ============================================================================

/// The stream names a run emits records for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet(BTreeSet<String>);

impl SelectionSet {
    /// Every stream of the catalog, regardless of metadata
    pub fn all(catalog: &Catalog) -> Self {
        catalog
            .streams
            .iter()
            .map(|e| e.tap_stream_id.clone())
            .collect()
    }

    /// Whether `stream` is selected
    pub fn contains(&self, stream: &str) -> bool {
        self.0.contains(stream)
    }

    /// Number of selected streams
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selected stream names, sorted
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl FromIterator<String> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete sync state
///
/// `currently_syncing` names the top-level stream whose traversal is in
/// progress. It is always serialized, as `null` when idle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// In-flight top-level stream
    #[serde(default)]
    pub currently_syncing: Option<String>,

    /// Per-stream bookmark values
    #[serde(default)]
    pub bookmarks: BTreeMap<String, JsonValue>,

    /// Top-level keys this tap does not interpret
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse state from a JSON string
    ///
    /// An empty document or `{}` yields the idle state.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }
        serde_json::from_str(json).map_err(|e| Error::state(format!("Failed to parse state: {e}")))
    }

    /// In-flight stream, treating an empty string as idle
    pub fn currently_syncing(&self) -> Option<&str> {
        self.currently_syncing
            .as_deref()
            .filter(|s| !s.is_empty())
    }

    /// Check if no stream is in flight
    pub fn is_idle(&self) -> bool {
        self.currently_syncing().is_none()
    }

    /// Get the bookmark for a stream
    pub fn get_bookmark(&self, stream: &str) -> Option<&JsonValue> {
        self.bookmarks.get(stream)
    }

    /// Get the bookmark for a stream, or `default` when unset
    pub fn get_bookmark_or(&self, stream: &str, default: JsonValue) -> JsonValue {
        self.bookmarks.get(stream).cloned().unwrap_or(default)
    }

    /// Set the bookmark for a stream
    pub fn set_bookmark(&mut self, stream: &str, value: JsonValue) {
        self.bookmarks.insert(stream.to_string(), value);
    }

    /// State as a JSON value
    pub fn to_value(&self) -> Result<JsonValue> {
        serde_json::to_value(self).map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }
}

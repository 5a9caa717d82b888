//! Key propagation
//!
//! A [`KeyBag`] carries the placeholder values accumulated while descending
//! the endpoint tree. Each child call receives a fresh bag derived from the
//! inherited one plus the parent's `provides` rules applied to one record.

use crate::error::{Error, Result};
use crate::types::{scalar_to_string, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder name to scalar value mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBag {
    values: BTreeMap<String, JsonValue>,
}

impl KeyBag {
    /// Create an empty bag (the root of every traversal)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly useful in tests and callers seeding a bag
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Insert or overwrite a value
    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) {
        self.values.insert(key.into(), value);
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// Look up a value rendered for path substitution
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.values.get(key).map(scalar_to_string)
    }

    /// Whether the bag has a value for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the bag is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.values.iter()
    }

    /// Derive the bag handed to the children of `record`.
    ///
    /// The inherited entries are copied and one entry is added per
    /// `(child_key, source_field)` rule, read directly from `record`.
    /// A missing or null source field fails with [`Error::KeyExtraction`].
    pub fn derive<'a>(
        &self,
        stream: &str,
        provides: impl IntoIterator<Item = (&'a String, &'a String)>,
        record: &JsonValue,
    ) -> Result<KeyBag> {
        let mut child = self.clone();
        for (child_key, source_field) in provides {
            let value = record
                .get(source_field.as_str())
                .filter(|v| !v.is_null())
                .ok_or_else(|| Error::key_extraction(stream, source_field.as_str()))?;
            child.insert(child_key.clone(), value.clone());
        }
        Ok(child)
    }
}

impl FromIterator<(String, JsonValue)> for KeyBag {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

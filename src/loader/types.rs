//! Loader types
//!
//! Declarative endpoint graph types for YAML parsing.

use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Endpoint Graph
// ============================================================================

/// Top-level endpoint graph definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EndpointGraph {
    /// Graph name (e.g. "zoom")
    pub name: String,
    /// Graph version
    #[serde(default = "default_version")]
    pub version: String,
    /// Base URL for all requests, overridable by the tap config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Connection check configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckDefinition>,
    /// Top-level endpoints, in declared order
    #[serde(with = "endpoint_map")]
    pub endpoints: Vec<EndpointDefinition>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Connection check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckDefinition {
    /// URL path for the check request
    pub path: String,
}

/// A node of a depth-first walk over the graph
#[derive(Debug, Clone, Copy)]
pub struct EndpointNode<'a> {
    /// The endpoint
    pub endpoint: &'a EndpointDefinition,
    /// 1 for top-level endpoints
    pub depth: usize,
    /// Stream name of the parent endpoint
    pub parent: Option<&'a str>,
}

impl EndpointGraph {
    /// Top-level endpoints in declared order
    pub fn top_level(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    /// Find an endpoint anywhere in the graph
    pub fn get(&self, stream: &str) -> Option<&EndpointDefinition> {
        self.endpoints.iter().find_map(|e| e.find(stream))
    }

    /// Whether `stream` names a top-level endpoint
    pub fn is_top_level(&self, stream: &str) -> bool {
        self.endpoints.iter().any(|e| e.name == stream)
    }

    /// Depth-first, pre-order walk in declared order
    pub fn walk(&self) -> Vec<EndpointNode<'_>> {
        let mut nodes = Vec::new();
        for endpoint in &self.endpoints {
            endpoint.walk_into(1, None, &mut nodes);
        }
        nodes
    }

    /// All stream names, depth-first
    pub fn stream_names(&self) -> Vec<&str> {
        self.walk().iter().map(|n| n.endpoint.name.as_str()).collect()
    }

    /// Maximum depth of the tree (0 for an empty graph)
    pub fn depth(&self) -> usize {
        self.endpoints
            .iter()
            .map(EndpointDefinition::depth)
            .max()
            .unwrap_or(0)
    }
}

// ============================================================================
// Endpoint Definition
// ============================================================================

/// One endpoint (stream) of the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EndpointDefinition {
    /// Stream name, taken from the mapping key
    #[serde(skip)]
    pub name: String,
    /// Request path template with `{placeholder}`s
    pub path: String,
    /// Key holding the record array; the whole body is one record when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_key: Option<String>,
    /// Follow `page_count` across pages
    #[serde(default = "default_true")]
    pub paginate: bool,
    /// Validate and emit records; otherwise only traverse them for child keys
    #[serde(default = "default_true")]
    pub persist: bool,
    /// Child key name -> source field on this endpoint's records
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub provides: BTreeMap<String, String>,
    /// Primary key fields
    #[serde(default, alias = "pk", skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    /// Inline JSON schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// Child endpoints, in declared order
    #[serde(default, with = "endpoint_map", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EndpointDefinition>,
}

fn default_true() -> bool {
    true
}

impl EndpointDefinition {
    /// Create an endpoint with defaults for everything but name and path
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            data_key: None,
            paginate: true,
            persist: true,
            provides: BTreeMap::new(),
            primary_key: Vec::new(),
            schema: None,
            children: Vec::new(),
        }
    }

    /// Set the data key
    #[must_use]
    pub fn with_data_key(mut self, key: impl Into<String>) -> Self {
        self.data_key = Some(key.into());
        self
    }

    /// Add a provides rule
    #[must_use]
    pub fn provides(mut self, child_key: impl Into<String>, field: impl Into<String>) -> Self {
        self.provides.insert(child_key.into(), field.into());
        self
    }

    /// Add a child endpoint
    #[must_use]
    pub fn with_child(mut self, child: EndpointDefinition) -> Self {
        self.children.push(child);
        self
    }

    /// Disable pagination
    #[must_use]
    pub fn without_pagination(mut self) -> Self {
        self.paginate = false;
        self
    }

    /// Traverse-only endpoint
    #[must_use]
    pub fn traverse_only(mut self) -> Self {
        self.persist = false;
        self
    }

    /// Whether records of this endpoint feed child endpoints
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Find this endpoint or a descendant by name
    pub fn find(&self, stream: &str) -> Option<&EndpointDefinition> {
        if self.name == stream {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(stream))
    }

    /// Depth of the subtree rooted here (1 for a leaf)
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(EndpointDefinition::depth)
            .max()
            .unwrap_or(0)
    }

    fn walk_into<'a>(
        &'a self,
        depth: usize,
        parent: Option<&'a str>,
        nodes: &mut Vec<EndpointNode<'a>>,
    ) {
        nodes.push(EndpointNode {
            endpoint: self,
            depth,
            parent,
        });
        for child in &self.children {
            child.walk_into(depth + 1, Some(&self.name), nodes);
        }
    }
}

/// (De)serializes an ordered `name -> endpoint` mapping into a `Vec`,
/// moving each key into the endpoint's `name`
mod endpoint_map {
    use super::EndpointDefinition;
    use serde::de::{MapAccess, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(
        endpoints: &[EndpointDefinition],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(endpoints.iter().map(|e| (&e.name, e)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<EndpointDefinition>, D::Error> {
        deserializer.deserialize_map(EndpointMapVisitor)
    }

    struct EndpointMapVisitor;

    impl<'de> Visitor<'de> for EndpointMapVisitor {
        type Value = Vec<EndpointDefinition>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping of stream name to endpoint definition")
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut endpoints = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, mut endpoint)) = map.next_entry::<String, EndpointDefinition>()? {
                endpoint.name = name;
                endpoints.push(endpoint);
            }
            Ok(endpoints)
        }
    }
}

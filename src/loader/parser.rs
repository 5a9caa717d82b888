//! YAML parser for endpoint graphs
//!
//! Parses and validates graph definition files.
//! Supports both built-in graphs (by name) and custom YAML files (by path).

use crate::connectors;
use crate::error::{Error, Result};
use crate::loader::types::{EndpointDefinition, EndpointGraph};
use crate::template;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Deepest endpoint nesting accepted at load time
pub const MAX_GRAPH_DEPTH: usize = 32;

/// Load an endpoint graph from a built-in name or a file path
///
/// # Examples
///
/// ```ignore
/// // Load built-in graph by name
/// let graph = load_graph("zoom")?;
///
/// // Load custom graph from file
/// let graph = load_graph("./my-endpoints.yaml")?;
/// ```
pub fn load_graph(path: impl AsRef<Path>) -> Result<EndpointGraph> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
        && !path_str.ends_with(".json")
    {
        if let Some(yaml) = connectors::get_builtin(&path_str) {
            return load_graph_from_str(yaml);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            let builtin_list = connectors::list_builtin().join(", ");
            Error::config(format!(
                "Endpoint graph '{}' not found. Built-in graphs: {}. Or provide a path to a YAML file.",
                path.display(),
                builtin_list
            ))
        } else {
            Error::config(format!(
                "Failed to read endpoint graph '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_graph_from_str(&content)
}

/// Load an endpoint graph from a YAML (or JSON) string
pub fn load_graph_from_str(yaml: &str) -> Result<EndpointGraph> {
    let graph: EndpointGraph = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse endpoint graph: {e}")))?;

    validate_graph(&graph)?;
    Ok(graph)
}

/// Validate an endpoint graph
fn validate_graph(graph: &EndpointGraph) -> Result<()> {
    if graph.name.is_empty() {
        return Err(Error::config("Graph name cannot be empty"));
    }

    if graph.endpoints.is_empty() {
        return Err(Error::config("Graph must have at least one endpoint"));
    }

    let depth = graph.depth();
    if depth > MAX_GRAPH_DEPTH {
        return Err(Error::config(format!(
            "Graph depth {depth} exceeds the maximum of {MAX_GRAPH_DEPTH}"
        )));
    }

    let mut seen = HashSet::new();
    for node in graph.walk() {
        if !seen.insert(node.endpoint.name.as_str()) {
            return Err(Error::config(format!(
                "Duplicate stream name '{}'",
                node.endpoint.name
            )));
        }
    }

    let root_keys = HashSet::new();
    for endpoint in &graph.endpoints {
        validate_endpoint(endpoint, &root_keys)?;
    }

    Ok(())
}

/// Validate one endpoint; `bound` holds the keys its ancestors provide
fn validate_endpoint(endpoint: &EndpointDefinition, bound: &HashSet<&str>) -> Result<()> {
    if endpoint.name.is_empty() {
        return Err(Error::config("Stream name cannot be empty"));
    }

    if endpoint.path.is_empty() {
        return Err(Error::config(format!(
            "Stream '{}' path cannot be empty",
            endpoint.name
        )));
    }

    if endpoint.data_key.as_deref() == Some("") {
        return Err(Error::config(format!(
            "Stream '{}' data_key cannot be empty",
            endpoint.name
        )));
    }

    for placeholder in template::placeholders(&endpoint.path) {
        if !bound.contains(placeholder.as_str()) {
            return Err(Error::unbound_placeholder(&endpoint.name, placeholder));
        }
    }

    for (child_key, field) in &endpoint.provides {
        if child_key.is_empty() || field.is_empty() {
            return Err(Error::config(format!(
                "Stream '{}' has an empty provides rule",
                endpoint.name
            )));
        }
    }

    if !endpoint.provides.is_empty() && !endpoint.has_children() {
        tracing::warn!(
            stream = %endpoint.name,
            "Endpoint provides keys but has no children; provides rules are ignored"
        );
    }

    let mut child_bound = bound.clone();
    child_bound.extend(endpoint.provides.keys().map(String::as_str));
    for child in &endpoint.children {
        validate_endpoint(child, &child_bound)?;
    }

    Ok(())
}

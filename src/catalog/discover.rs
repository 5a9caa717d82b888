//! Catalog discovery from an endpoint graph

use super::types::{
    Catalog, CatalogEntry, MetadataEntry, INCLUSION, PARENT_TAP_STREAM_ID, SELECTED_BY_DEFAULT,
    TABLE_KEY_PROPERTIES,
};
use crate::error::{Error, Result, ResultExt};
use crate::loader::{EndpointDefinition, EndpointGraph};
use crate::schema::Schema;
use crate::types::{JsonObject, JsonValue};
use std::path::Path;
use tracing::debug;

/// Build a catalog entry for every persisted endpoint, depth-first in
/// declared order.
///
/// The schema comes from the inline definition, then
/// `<schemas_dir>/<stream>.json`, then a permissive object schema.
pub fn discover(graph: &EndpointGraph, schemas_dir: Option<&Path>) -> Result<Catalog> {
    let mut streams = Vec::new();

    for node in graph.walk() {
        let endpoint = node.endpoint;
        if !endpoint.persist {
            continue;
        }

        let schema = resolve_schema(endpoint, schemas_dir)?;
        let metadata = build_metadata(endpoint, &schema, node.parent);

        streams.push(CatalogEntry {
            tap_stream_id: endpoint.name.clone(),
            stream: endpoint.name.clone(),
            key_properties: endpoint.primary_key.clone(),
            schema,
            metadata,
        });
    }

    debug!(graph = %graph.name, streams = streams.len(), "Discovered catalog");
    Ok(Catalog { streams })
}

fn resolve_schema(endpoint: &EndpointDefinition, schemas_dir: Option<&Path>) -> Result<Schema> {
    if let Some(schema) = &endpoint.schema {
        return Ok(schema.clone());
    }

    if let Some(dir) = schemas_dir {
        let path = dir.join(format!("{}.json", endpoint.name));
        if path.is_file() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read schema file '{}'", path.display()))?;
            return serde_json::from_str(&content).map_err(|e| {
                Error::config(format!("Invalid schema file '{}': {e}", path.display()))
            });
        }
    }

    Ok(Schema::permissive_object())
}

fn build_metadata(
    endpoint: &EndpointDefinition,
    schema: &Schema,
    parent: Option<&str>,
) -> Vec<MetadataEntry> {
    let mut root = JsonObject::new();
    root.insert(
        TABLE_KEY_PROPERTIES.to_string(),
        JsonValue::from(endpoint.primary_key.clone()),
    );
    root.insert(SELECTED_BY_DEFAULT.to_string(), JsonValue::Bool(true));
    if let Some(parent) = parent {
        root.insert(PARENT_TAP_STREAM_ID.to_string(), JsonValue::from(parent));
    }

    let mut metadata = vec![MetadataEntry::root(root)];
    for field in schema.property_names() {
        let inclusion = if endpoint.primary_key.contains(field) {
            "automatic"
        } else {
            "available"
        };
        let mut entry = JsonObject::new();
        entry.insert(INCLUSION.to_string(), JsonValue::from(inclusion));
        entry.insert(SELECTED_BY_DEFAULT.to_string(), JsonValue::Bool(true));
        metadata.push(MetadataEntry::property(field.clone(), entry));
    }
    metadata
}

//! Schema types

use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON Schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonType {
    /// Whether `value` already has this type, without any coercion
    pub fn matches(self, value: &JsonValue) -> bool {
        match self {
            JsonType::String => value.is_string(),
            JsonType::Number => value.is_number(),
            JsonType::Integer => value.is_i64() || value.is_u64(),
            JsonType::Boolean => value.is_boolean(),
            JsonType::Object => value.is_object(),
            JsonType::Array => value.is_array(),
            JsonType::Null => value.is_null(),
        }
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonType::String => write!(f, "string"),
            JsonType::Number => write!(f, "number"),
            JsonType::Integer => write!(f, "integer"),
            JsonType::Boolean => write!(f, "boolean"),
            JsonType::Object => write!(f, "object"),
            JsonType::Array => write!(f, "array"),
            JsonType::Null => write!(f, "null"),
        }
    }
}

/// JSON type can be a single type or array of types (for nullable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonTypeOrArray {
    Single(JsonType),
    Multiple(Vec<JsonType>),
}

impl JsonTypeOrArray {
    /// Create a single type
    pub fn single(t: JsonType) -> Self {
        JsonTypeOrArray::Single(t)
    }

    /// Create a nullable type
    pub fn nullable(t: JsonType) -> Self {
        if t == JsonType::Null {
            JsonTypeOrArray::Single(JsonType::Null)
        } else {
            JsonTypeOrArray::Multiple(vec![t, JsonType::Null])
        }
    }

    /// All declared types, in declaration order
    pub fn types(&self) -> &[JsonType] {
        match self {
            JsonTypeOrArray::Single(t) => std::slice::from_ref(t),
            JsonTypeOrArray::Multiple(types) => types,
        }
    }

    /// Check if this type is nullable
    pub fn is_nullable(&self) -> bool {
        self.types().contains(&JsonType::Null)
    }

    /// Get the primary (non-null) type
    pub fn primary_type(&self) -> Option<JsonType> {
        self.types().iter().copied().find(|t| *t != JsonType::Null)
    }
}

impl std::fmt::Display for JsonTypeOrArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.types().iter().map(ToString::to_string).collect();
        write!(f, "{}", names.join("|"))
    }
}

/// A JSON Schema node
///
/// Only the keywords the transformer acts on are typed; everything else
/// is kept in `extra` so schemas survive a load/emit round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Property type(s)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub json_type: Option<JsonTypeOrArray>,

    /// Format hint (e.g., "date-time")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Nested properties (for objects)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,

    /// Additional properties: a boolean or a schema
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<JsonValue>,

    /// Array items schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    /// Alternatives, the first one that accepts the value wins
    #[serde(rename = "anyOf", default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,

    /// Any other keyword
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl Schema {
    /// Create a schema with the given type
    pub fn new(json_type: JsonType) -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::single(json_type)),
            ..Default::default()
        }
    }

    /// Create a nullable schema
    pub fn nullable(json_type: JsonType) -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::nullable(json_type)),
            ..Default::default()
        }
    }

    /// Create an object schema with nested properties
    pub fn object(properties: BTreeMap<String, Schema>) -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::single(JsonType::Object)),
            properties: Some(properties),
            ..Default::default()
        }
    }

    /// An object schema that accepts any properties
    pub fn permissive_object() -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::single(JsonType::Object)),
            additional_properties: Some(JsonValue::Bool(true)),
            ..Default::default()
        }
    }

    /// Create an array schema with an item schema
    pub fn array(items: Schema) -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::single(JsonType::Array)),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Set format hint
    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Whether properties not listed in `properties` are kept.
    ///
    /// Undeclared properties are kept when `additionalProperties` is
    /// `true` or a schema, or when the object declares no properties.
    pub fn allows_additional(&self) -> bool {
        match &self.additional_properties {
            Some(JsonValue::Bool(allowed)) => *allowed,
            Some(JsonValue::Object(_)) => true,
            _ => self.properties.is_none(),
        }
    }

    /// Get a property
    pub fn get_property(&self, name: &str) -> Option<&Schema> {
        self.properties.as_ref()?.get(name)
    }

    /// Names of the top-level properties
    pub fn property_names(&self) -> impl Iterator<Item = &String> {
        self.properties.iter().flat_map(BTreeMap::keys)
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_default()
    }
}

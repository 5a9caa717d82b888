//! Record transformer
//!
//! Coerces a raw API record into the shape declared by its stream schema.

use super::types::{JsonType, Schema};
use crate::types::{JsonObject, JsonValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

/// 2^63; integral floats must lie in `[-2^63, 2^63)` to fit an `i64`
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// A record could not be coerced to its schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct TransformError {
    /// Dotted path of the offending value (`$` for the record itself)
    pub path: String,
    /// What went wrong
    pub message: String,
}

impl TransformError {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: if path.is_empty() {
                "$".to_string()
            } else {
                path.to_string()
            },
            message: message.into(),
        }
    }
}

type TransformResult<T> = std::result::Result<T, TransformError>;

/// Schema-driven record transformer
///
/// Tracks which paths were dropped across all records it transformed so a
/// single summary can be logged per page.
#[derive(Debug, Default)]
pub struct Transformer {
    /// Paths dropped because the schema does not declare them
    removed: BTreeSet<String>,
    /// Top-level fields dropped because metadata deselected them
    filtered: BTreeSet<String>,
}

impl Transformer {
    /// Create a new transformer
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform one record.
    ///
    /// `excluded_fields` holds top-level field names that metadata marks as
    /// deselected or unsupported; they are dropped before coercion.
    pub fn transform(
        &mut self,
        record: &JsonValue,
        schema: &Schema,
        excluded_fields: &BTreeSet<String>,
    ) -> TransformResult<JsonValue> {
        let filtered;
        let record = match record {
            JsonValue::Object(map) if !excluded_fields.is_empty() => {
                let mut kept = JsonObject::new();
                for (key, value) in map {
                    if excluded_fields.contains(key) {
                        self.filtered.insert(key.clone());
                    } else {
                        kept.insert(key.clone(), value.clone());
                    }
                }
                filtered = JsonValue::Object(kept);
                &filtered
            }
            other => other,
        };

        self.transform_value(record, schema, "")
    }

    /// Paths removed because they are not declared in the schema
    pub fn removed_paths(&self) -> &BTreeSet<String> {
        &self.removed
    }

    /// Fields removed because metadata excluded them
    pub fn filtered_fields(&self) -> &BTreeSet<String> {
        &self.filtered
    }

    /// Log what was dropped, if anything
    pub fn log_summary(&self, stream: &str) {
        if !self.removed.is_empty() {
            debug!(stream, removed = ?self.removed, "Removed paths not declared in schema");
        }
        if !self.filtered.is_empty() {
            debug!(stream, filtered = ?self.filtered, "Filtered fields excluded by metadata");
        }
    }

    fn transform_value(
        &mut self,
        value: &JsonValue,
        schema: &Schema,
        path: &str,
    ) -> TransformResult<JsonValue> {
        if let Some(branches) = &schema.any_of {
            for branch in branches {
                if let Ok(v) = self.transform_value(value, branch, path) {
                    return Ok(v);
                }
            }
            return Err(TransformError::new(path, "value matches no anyOf branch"));
        }

        let Some(declared) = &schema.json_type else {
            return Ok(value.clone());
        };

        if value.is_null() {
            return if declared.is_nullable() {
                Ok(JsonValue::Null)
            } else {
                Err(TransformError::new(
                    path,
                    format!("null is not allowed for type {declared}"),
                ))
            };
        }

        // Exact type matches win over coercions, then declaration order
        let (exact, others): (Vec<JsonType>, Vec<JsonType>) = declared
            .types()
            .iter()
            .copied()
            .filter(|t| *t != JsonType::Null)
            .partition(|t| t.matches(value));

        for t in exact.into_iter().chain(others) {
            if let Some(v) = self.coerce(value, t, schema, path)? {
                return Ok(v);
            }
        }

        Err(TransformError::new(
            path,
            format!("cannot coerce {} to {declared}", describe(value)),
        ))
    }

    fn coerce(
        &mut self,
        value: &JsonValue,
        target: JsonType,
        schema: &Schema,
        path: &str,
    ) -> TransformResult<Option<JsonValue>> {
        let coerced = match (target, value) {
            (JsonType::Object, JsonValue::Object(map)) => {
                Some(self.transform_object(map, schema, path)?)
            }
            (JsonType::Array, JsonValue::Array(items)) => {
                Some(self.transform_array(items, schema, path)?)
            }
            (JsonType::Integer, JsonValue::Number(n)) => {
                if n.is_i64() || n.is_u64() {
                    Some(value.clone())
                } else {
                    match n.as_f64().filter(|f| f.fract() == 0.0 && f.is_finite()) {
                        Some(f) if (-I64_LIMIT..I64_LIMIT).contains(&f) => {
                            Some(JsonValue::from(f as i64))
                        }
                        Some(_) => {
                            return Err(TransformError::new(
                                path,
                                format!("{n} is out of range for integer"),
                            ))
                        }
                        None => None,
                    }
                }
            }
            (JsonType::Integer, JsonValue::String(s)) => {
                s.trim().parse::<i64>().ok().map(JsonValue::from)
            }
            (JsonType::Number, JsonValue::Number(_)) => Some(value.clone()),
            (JsonType::Number, JsonValue::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number),
            (JsonType::Boolean, JsonValue::Bool(_)) => Some(value.clone()),
            (JsonType::Boolean, JsonValue::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" => Some(JsonValue::Bool(true)),
                "false" => Some(JsonValue::Bool(false)),
                _ => None,
            },
            (JsonType::String, JsonValue::String(s)) => {
                if schema.format.as_deref() == Some("date-time") {
                    let normalized = normalize_date_time(s).ok_or_else(|| {
                        TransformError::new(path, format!("'{s}' is not a valid date-time"))
                    })?;
                    Some(JsonValue::String(normalized))
                } else {
                    Some(value.clone())
                }
            }
            (JsonType::String, JsonValue::Number(n)) => Some(JsonValue::String(n.to_string())),
            (JsonType::String, JsonValue::Bool(b)) => Some(JsonValue::String(b.to_string())),
            _ => None,
        };
        Ok(coerced)
    }

    fn transform_object(
        &mut self,
        map: &JsonObject,
        schema: &Schema,
        path: &str,
    ) -> TransformResult<JsonValue> {
        let keep_undeclared = schema.allows_additional();
        let mut out = JsonObject::new();

        for (key, value) in map {
            let field_path = join_path(path, key);
            match schema.get_property(key) {
                Some(property) => {
                    out.insert(
                        key.clone(),
                        self.transform_value(value, property, &field_path)?,
                    );
                }
                None if keep_undeclared => {
                    out.insert(key.clone(), value.clone());
                }
                None => {
                    self.removed.insert(field_path);
                }
            }
        }

        Ok(JsonValue::Object(out))
    }

    fn transform_array(
        &mut self,
        items: &[JsonValue],
        schema: &Schema,
        path: &str,
    ) -> TransformResult<JsonValue> {
        let Some(item_schema) = &schema.items else {
            return Ok(JsonValue::Array(items.to_vec()));
        };

        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            out.push(self.transform_value(item, item_schema, &format!("{path}[{i}]"))?);
        }
        Ok(JsonValue::Array(out))
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn describe(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Parse a date-time string and render it as RFC 3339 UTC with microseconds
fn normalize_date_time(s: &str) -> Option<String> {
    let s = s.trim();
    let parsed: DateTime<Utc> = if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        dt.with_timezone(&Utc)
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        naive.and_utc()
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        naive.and_utc()
    } else {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?
            .and_utc()
    };
    Some(parsed.to_rfc3339_opts(SecondsFormat::Micros, true))
}

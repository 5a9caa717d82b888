//! Schema module
//!
//! Typed JSON Schema model used by stream definitions and the catalog,
//! plus the record transformer that coerces raw API records into the
//! shape their schema declares.
//!
//! # Features
//!
//! - **Round-tripping**: unknown schema keywords are preserved
//! - **Type Coercion**: strings to numbers/booleans, numbers to strings
//! - **Date-Time Normalization**: `date-time` strings become RFC 3339 UTC
//! - **Field Filtering**: undeclared and deselected fields are dropped

mod transform;
mod types;

pub use transform::{TransformError, Transformer};
pub use types::{JsonType, JsonTypeOrArray, Schema};

//! Endpoint graph loader
//!
//! Parse endpoint graph definitions from YAML (or JSON) files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `EndpointGraph` - The declarative tree of streams to sync
//! - `EndpointDefinition` - One node: path, pagination, key passing, children
//! - YAML parsing with load-time validation

mod parser;
mod types;

pub use parser::{load_graph, load_graph_from_str, MAX_GRAPH_DEPTH};
pub use types::{CheckDefinition, EndpointDefinition, EndpointGraph, EndpointNode};

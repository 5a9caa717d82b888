// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-zoom
//!
//! A Singer tap for the Zoom API, built on a hierarchical sync engine that
//! walks a declarative endpoint graph.
//!
//! ## Features
//!
//! - **Endpoint graphs**: streams, their paths and nested children in YAML
//! - **Key propagation**: parent record fields fill child path placeholders
//! - **Page-count pagination**: the server's page size and count drive paging
//! - **Selective emission**: traverse-only endpoints and catalog selection
//! - **Resumable state**: `currently_syncing` checkpoint persisted on change
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tap_zoom::{load_graph, HttpClient, JsonLinesSink, StateManager, SyncEngine};
//!
//! #[tokio::main]
//! async fn main() -> tap_zoom::Result<()> {
//!     let graph = load_graph("zoom")?;
//!     let client = Arc::new(HttpClient::new()?);
//!     let sink = Arc::new(JsonLinesSink::stdout());
//!
//!     let mut engine = SyncEngine::new(client, sink, StateManager::in_memory());
//!     let stats = engine.run(&graph, None).await?;
//!     eprintln!("{} records", stats.total_records());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         SyncEngine::run                         │
//! │  mark_syncing(stream) → sync_endpoint(…) → mark_syncing(none)   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Loader  │ PageSource│   Paginate    │  Catalog  │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ YAML     │ HttpClient│ page_count    │ Discover  │ SCHEMA      │
//! │ Validate │ Auth      │ page_size     │ Selection │ RECORD      │
//! │ Built-in │ Retry     │ Single page   │ Transform │ STATE       │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication implementations
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Page source abstraction
pub mod source;

/// Pagination strategies
pub mod pagination;

/// Child key bags
pub mod keys;

/// Path placeholder rendering
pub mod template;

/// Endpoint graph loader
pub mod loader;

/// Built-in endpoint graphs
pub mod connectors;

/// JSON schema model and record transformer
pub mod schema;

/// Catalog discovery and stream selection
pub mod catalog;

/// Singer messages and sinks
pub mod output;

/// Checkpoint and bookmark state
pub mod state;

/// Run metrics
pub mod metrics;

/// Hierarchical sync engine
pub mod engine;

/// Tap configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorKind, Result};
pub use types::*;

// Re-export commonly used types
pub use catalog::{discover, Catalog, SelectionSet};
pub use config::TapConfig;
pub use engine::{CancellationFlag, SyncConfig, SyncEngine, SyncStats};
pub use http::HttpClient;
pub use keys::KeyBag;
pub use loader::{load_graph, load_graph_from_str, EndpointDefinition, EndpointGraph};
pub use output::{JsonLinesSink, MemorySink, Message, RecordSink};
pub use source::PageSource;
pub use state::{State, StateManager, StateStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

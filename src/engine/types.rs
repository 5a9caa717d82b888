//! Engine types
//!
//! Configuration, cancellation and statistics for the sync engine.

use crate::loader::MAX_GRAPH_DEPTH;
use crate::pagination::DEFAULT_PAGE_SIZE;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag raised to stop a running sync
///
/// The engine checks it between page requests and between records.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create a lowered flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check if the flag was raised
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Configuration for sync operation
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Page size requested on the first page of every endpoint
    pub page_size: u64,
    /// Deepest endpoint nesting the engine will descend into
    pub max_depth: usize,
    /// Start at the top-level stream named by `currently_syncing`
    pub resume_from_checkpoint: bool,
    /// Cancellation flag
    pub cancellation: CancellationFlag,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_depth: MAX_GRAPH_DEPTH,
            resume_from_checkpoint: false,
            cancellation: CancellationFlag::new(),
        }
    }
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial page size
    #[must_use]
    pub fn with_page_size(mut self, size: u64) -> Self {
        self.page_size = size;
        self
    }

    /// Set the depth ceiling
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Resume from the persisted checkpoint
    #[must_use]
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume_from_checkpoint = resume;
        self
    }

    /// Use an existing cancellation flag
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Pages fetched across all endpoints
    pub pages_fetched: u64,
    /// Records emitted per stream
    pub records_emitted: BTreeMap<String, u64>,
    /// Records walked for child keys only
    pub records_traversed: u64,
    /// Top-level streams finished
    pub streams_completed: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Count one emitted record
    pub fn add_record(&mut self, stream: &str) {
        *self.records_emitted.entry(stream.to_string()).or_default() += 1;
    }

    /// Count one traversed, unemitted record
    pub fn add_traversed(&mut self) {
        self.records_traversed += 1;
    }

    /// Add a finished top-level stream
    pub fn add_stream(&mut self) {
        self.streams_completed += 1;
    }

    /// Records emitted for one stream
    pub fn records_for(&self, stream: &str) -> u64 {
        self.records_emitted.get(stream).copied().unwrap_or(0)
    }

    /// Records emitted across all streams
    pub fn total_records(&self) -> u64 {
        self.records_emitted.values().sum()
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

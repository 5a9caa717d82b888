//! State stores
//!
//! Durable destinations for the complete sync state. A store's `persist`
//! only returns once the state has been written.

use super::types::State;
use crate::error::{Error, Result};
use crate::output::RecordSink;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Loads and persists the complete sync state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the last persisted state
    async fn load(&self) -> Result<State>;

    /// Persist the complete state
    async fn persist(&self, state: &State) -> Result<()>;
}

// ============================================================================
// File
// ============================================================================

/// JSON file on disk, replaced atomically on every persist
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Store backed by `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<State> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(State::new()),
            Err(e) => {
                return Err(Error::State {
                    message: format!("Failed to read state file: {e}"),
                })
            }
        };
        State::from_json(&contents)
    }

    async fn persist(&self, state: &State) -> Result<()> {
        let contents = serde_json::to_string_pretty(state).map_err(|e| Error::State {
            message: format!("Failed to serialize state: {e}"),
        })?;

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to write state file: {e}"),
            })?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to rename state file: {e}"),
            })?;

        Ok(())
    }
}

// ============================================================================
// Sink
// ============================================================================

/// Writes every persisted state as a `STATE` message
pub struct SinkStateStore {
    sink: Arc<dyn RecordSink>,
    initial: State,
}

impl SinkStateStore {
    /// Store emitting to `sink`
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self {
            sink,
            initial: State::new(),
        }
    }

    /// State returned by `load`, usually the state passed on the command line
    pub fn with_initial(mut self, state: State) -> Self {
        self.initial = state;
        self
    }
}

impl std::fmt::Debug for SinkStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkStateStore")
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StateStore for SinkStateStore {
    async fn load(&self) -> Result<State> {
        Ok(self.initial.clone())
    }

    async fn persist(&self, state: &State) -> Result<()> {
        self.sink.emit_state(state.to_value()?)
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Keeps every persisted snapshot
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    snapshots: Arc<RwLock<Vec<State>>>,
}

impl MemoryStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose `load` returns `state`
    pub fn with_state(state: State) -> Self {
        Self {
            snapshots: Arc::new(RwLock::new(vec![state])),
        }
    }

    /// Every persisted state, oldest first
    pub async fn snapshots(&self) -> Vec<State> {
        self.snapshots.read().await.clone()
    }

    /// `currently_syncing` of every snapshot, oldest first
    pub async fn checkpoints(&self) -> Vec<Option<String>> {
        self.snapshots
            .read()
            .await
            .iter()
            .map(|s| s.currently_syncing().map(ToString::to_string))
            .collect()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<State> {
        Ok(self
            .snapshots
            .read()
            .await
            .last()
            .cloned()
            .unwrap_or_default())
    }

    async fn persist(&self, state: &State) -> Result<()> {
        self.snapshots.write().await.push(state.clone());
        Ok(())
    }
}

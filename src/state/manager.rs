//! State manager implementation
//!
//! Owns the in-memory state and persists the whole of it to every
//! configured store after each mutation.

use super::store::StateStore;
use super::types::State;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Checkpoint and bookmark tracker
pub struct StateManager {
    /// Current state (cached)
    state: Arc<RwLock<State>>,
    /// Stores written on every mutation
    stores: Vec<Arc<dyn StateStore>>,
}

impl StateManager {
    /// Create a manager holding `state` with no stores
    pub fn new(state: State) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            stores: Vec::new(),
        }
    }

    /// Create a manager with empty state and no stores
    pub fn in_memory() -> Self {
        Self::new(State::new())
    }

    /// Load state from `store` and persist back to it
    pub async fn from_store(store: Arc<dyn StateStore>) -> Result<Self> {
        let state = store.load().await?;
        Ok(Self::new(state).with_store(store))
    }

    /// Add a store
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.stores.push(store);
        self
    }

    /// Number of configured stores
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// Set or clear the in-flight top-level stream, then persist
    pub async fn mark_syncing(&self, stream: Option<&str>) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.currently_syncing = stream.map(ToString::to_string);
        }
        debug!(currently_syncing = ?stream, "Checkpoint updated");
        self.persist().await
    }

    /// Set a stream's bookmark, then persist
    pub async fn set_bookmark(&self, stream: &str, value: JsonValue) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.set_bookmark(stream, value);
        }
        self.persist().await
    }

    /// Get a stream's bookmark, or `default` when unset
    pub async fn get_bookmark(&self, stream: &str, default: JsonValue) -> JsonValue {
        self.state.read().await.get_bookmark_or(stream, default)
    }

    /// In-flight top-level stream
    pub async fn currently_syncing(&self) -> Option<String> {
        self.state
            .read()
            .await
            .currently_syncing()
            .map(ToString::to_string)
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Write the complete state to every store
    pub async fn persist(&self) -> Result<()> {
        let state = self.snapshot().await;
        for store in &self.stores {
            store.persist(&state).await?;
        }
        Ok(())
    }

    /// Export state as pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string_pretty(&*state).map_err(|e| Error::State {
            message: format!("Failed to serialize state: {e}"),
        })
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            stores: self.stores.clone(),
        }
    }
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("stores", &self.stores.len())
            .finish_non_exhaustive()
    }
}

//! State management module
//!
//! Tracks the in-flight top-level stream and per-stream bookmarks.
//! The whole state is persisted after every change so an interrupted run
//! can be resumed.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - `currently_syncing` plus bookmarks
//! - `StateStore` - persistence trait with file, sink and memory stores
//! - `StateManager` - mutation API that persists to every store

mod manager;
mod store;
mod types;

pub use manager::StateManager;
pub use store::{FileStateStore, MemoryStateStore, SinkStateStore, StateStore};
pub use types::State;

//! Output module
//!
//! Singer message types and the sinks they are written to.
//!
//! # Overview
//!
//! - `Message` - SCHEMA, RECORD and STATE messages
//! - `RecordSink` - destination trait used by the sync engine
//! - `JsonLinesSink` - one JSON object per line (stdout in the binary)
//! - `MemorySink` - in-memory capture

mod message;
mod sink;

pub use message::Message;
pub use sink::{JsonLinesSink, MemorySink, RecordSink};

#[cfg(test)]
mod tests;

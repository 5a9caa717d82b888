//! Record sinks
//!
//! Where the sync engine sends schema, record and state messages.

use super::message::Message;
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::JsonValue;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

/// Destination for Singer messages
pub trait RecordSink: Send + Sync {
    /// Write one message
    fn emit(&self, message: Message) -> Result<()>;

    /// Write a schema message
    fn emit_schema(&self, stream: &str, schema: &Schema, key_properties: &[String]) -> Result<()> {
        self.emit(Message::schema(
            stream,
            schema.clone(),
            key_properties.to_vec(),
        ))
    }

    /// Write a record message
    fn emit_record(
        &self,
        stream: &str,
        record: JsonValue,
        time_extracted: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.emit(Message::record(stream, record, time_extracted))
    }

    /// Write a state message
    fn emit_state(&self, value: JsonValue) -> Result<()> {
        self.emit(Message::state(value))
    }
}

impl<T: RecordSink + ?Sized> RecordSink for Arc<T> {
    fn emit(&self, message: Message) -> Result<()> {
        (**self).emit(message)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::output("sink lock poisoned"))
}

// ============================================================================
// JSON Lines
// ============================================================================

/// Writes one JSON object per line
///
/// State messages are flushed immediately so a downstream target sees them
/// as soon as they are persisted.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonLinesSink<std::io::Stdout> {
    /// Sink writing to stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Sink writing to any writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Flush buffered output
    pub fn flush(&self) -> Result<()> {
        lock(&self.writer)?.flush()?;
        Ok(())
    }

    /// Recover the writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|_| Error::output("sink lock poisoned"))
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn emit(&self, message: Message) -> Result<()> {
        let line = message.to_json_line()?;
        let mut writer = lock(&self.writer)?;
        writeln!(writer, "{line}")?;
        if message.is_state() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl<W: Write + Send> std::fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink").finish_non_exhaustive()
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<Message>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages so far, in order
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Records written for `stream`, in order
    pub fn records(&self, stream: &str) -> Vec<JsonValue> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::Record {
                    stream: s, record, ..
                } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Streams a schema was written for, in order
    pub fn schema_streams(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::Schema { stream, .. } => Some(stream),
                _ => None,
            })
            .collect()
    }

    /// State values written, in order
    pub fn states(&self) -> Vec<JsonValue> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::State { value } => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Drop all messages
    pub fn clear(&self) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.clear();
        }
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, message: Message) -> Result<()> {
        lock(&self.messages)?.push(message);
        Ok(())
    }
}

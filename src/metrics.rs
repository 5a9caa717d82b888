//! Run metrics
//!
//! Counters are logged as `METRIC: {json}` lines under the
//! `tap_zoom::metrics` target, the format Singer tooling parses.

use crate::types::JsonValue;
use serde_json::json;
use tracing::info;

/// Name of the per-page record counter
pub const RECORD_COUNT: &str = "record_count";

/// A named counter tagged with the endpoint it measures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    metric: &'static str,
    endpoint: String,
    value: u64,
}

impl Counter {
    /// Counter of emitted records for `endpoint`
    pub fn record_count(endpoint: impl Into<String>) -> Self {
        Self {
            metric: RECORD_COUNT,
            endpoint: endpoint.into(),
            value: 0,
        }
    }

    /// Add one
    pub fn increment(&mut self) {
        self.value += 1;
    }

    /// Current value
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Metric line payload
    pub fn to_json(&self) -> JsonValue {
        json!({
            "type": "counter",
            "metric": self.metric,
            "value": self.value,
            "tags": {"endpoint": self.endpoint},
        })
    }

    /// Log the current value and reset it
    pub fn flush(&mut self) {
        info!(target: "tap_zoom::metrics", "METRIC: {}", self.to_json());
        self.value = 0;
    }
}

impl Drop for Counter {
    /// Unflushed counts are logged when the counter goes out of scope,
    /// including when a page is abandoned on error.
    fn drop(&mut self) {
        if self.value > 0 {
            self.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_record_count_payload() {
        let mut counter = Counter::record_count("users");
        counter.increment();
        counter.increment();

        assert_eq!(
            counter.to_json(),
            json!({
                "type": "counter",
                "metric": "record_count",
                "value": 2,
                "tags": {"endpoint": "users"}
            })
        );
    }

    fn capture(f: impl FnOnce()) -> String {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || SharedBuf(writer.clone()))
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_drop_flushes_pending_count() {
        let logs = capture(|| {
            let mut counter = Counter::record_count("meetings");
            counter.increment();
            counter.increment();
            counter.increment();
        });

        assert_eq!(logs.matches("METRIC:").count(), 1);
        assert!(logs.contains(r#""value":3"#));
        assert!(logs.contains(r#""endpoint":"meetings""#));
    }

    #[test]
    fn test_drop_after_flush_logs_once() {
        let logs = capture(|| {
            let mut counter = Counter::record_count("users");
            counter.increment();
            counter.flush();
        });

        assert_eq!(logs.matches("METRIC:").count(), 1);
    }

    #[test]
    fn test_flush_resets() {
        let mut counter = Counter::record_count("users");
        counter.increment();
        counter.flush();
        assert_eq!(counter.value(), 0);
    }
}

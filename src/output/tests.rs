//! Tests for the output module

use super::*;
use crate::schema::{JsonType, Schema};
use chrono::TimeZone;
use pretty_assertions::assert_eq;
use serde_json::json;

// ============================================================================
// Message Tests
// ============================================================================

#[test]
fn test_schema_message_format() {
    let msg = Message::schema("users", Schema::new(JsonType::Object), vec!["id".to_string()]);
    let value: serde_json::Value = serde_json::from_str(&msg.to_json_line().unwrap()).unwrap();

    assert_eq!(
        value,
        json!({
            "type": "SCHEMA",
            "stream": "users",
            "schema": {"type": "object"},
            "key_properties": ["id"]
        })
    );
}

#[test]
fn test_record_message_format() {
    let extracted = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    let msg = Message::record("users", json!({"id": "u1"}), Some(extracted));
    let value: serde_json::Value = serde_json::from_str(&msg.to_json_line().unwrap()).unwrap();

    assert_eq!(value["type"], "RECORD");
    assert_eq!(value["stream"], "users");
    assert_eq!(value["record"], json!({"id": "u1"}));
    assert!(value["time_extracted"]
        .as_str()
        .unwrap()
        .starts_with("2024-03-01T10:00:00"));
}

#[test]
fn test_record_without_time_extracted() {
    let msg = Message::record("users", json!({}), None);
    let line = msg.to_json_line().unwrap();
    assert!(!line.contains("time_extracted"));
}

#[test]
fn test_state_message_format() {
    let msg = Message::state(json!({"currently_syncing": "users", "bookmarks": {}}));
    let value: serde_json::Value = serde_json::from_str(&msg.to_json_line().unwrap()).unwrap();

    assert_eq!(
        value,
        json!({
            "type": "STATE",
            "value": {"currently_syncing": "users", "bookmarks": {}}
        })
    );
}

#[test]
fn test_message_parse_back() {
    let line = r#"{"type":"RECORD","stream":"meetings","record":{"uuid":"abc=="}}"#;
    let msg: Message = serde_json::from_str(line).unwrap();
    assert!(msg.is_record());
    assert_eq!(msg.stream(), Some("meetings"));
}

#[test]
fn test_message_kind_helpers() {
    let schema = Message::schema("s", Schema::permissive_object(), vec![]);
    let state = Message::state(json!({}));
    assert!(schema.is_schema());
    assert!(!schema.is_state());
    assert!(state.is_state());
    assert_eq!(state.stream(), None);
}

// ============================================================================
// Sink Tests
// ============================================================================

#[test]
fn test_json_lines_sink_writes_one_line_per_message() {
    let sink = JsonLinesSink::new(Vec::new());
    sink.emit_schema("users", &Schema::permissive_object(), &["id".to_string()])
        .unwrap();
    sink.emit_record("users", json!({"id": "u1"}), None).unwrap();
    sink.emit_state(json!({"currently_syncing": null})).unwrap();

    let output = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains(r#""type":"SCHEMA""#));
    assert!(lines[1].contains(r#""type":"RECORD""#));
    assert!(lines[2].contains(r#""type":"STATE""#));
}

#[test]
fn test_memory_sink_helpers() {
    let sink = MemorySink::new();
    sink.emit_schema("users", &Schema::permissive_object(), &[])
        .unwrap();
    sink.emit_record("users", json!({"id": 1}), None).unwrap();
    sink.emit_record("roles", json!({"role": "admin"}), None)
        .unwrap();
    sink.emit_state(json!({"bookmarks": {}})).unwrap();

    assert_eq!(sink.messages().len(), 4);
    assert_eq!(sink.records("users"), vec![json!({"id": 1})]);
    assert_eq!(sink.records("roles"), vec![json!({"role": "admin"})]);
    assert_eq!(sink.schema_streams(), vec!["users".to_string()]);
    assert_eq!(sink.states(), vec![json!({"bookmarks": {}})]);

    sink.clear();
    assert!(sink.messages().is_empty());
}

#[test]
fn test_arc_sink_shares_messages() {
    let sink = std::sync::Arc::new(MemorySink::new());
    let shared: std::sync::Arc<dyn RecordSink> = sink.clone();
    shared.emit_state(json!({})).unwrap();
    assert_eq!(sink.states().len(), 1);
}

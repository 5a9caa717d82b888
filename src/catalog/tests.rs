//! Catalog tests

use super::*;
use crate::loader::load_graph_from_str;
use serde_json::json;

const GRAPH: &str = r#"
name: test
endpoints:
  users:
    path: users
    data_key: users
    primary_key: [id]
    provides:
      user_id: id
    schema:
      type: object
      properties:
        id: {type: string}
        email: {type: [string, "null"]}
    children:
      list_meetings:
        path: users/{user_id}/meetings
        data_key: meetings
        persist: false
        provides:
          meeting_id: id
        children:
          meetings:
            path: meetings/{meeting_id}
            primary_key: [uuid]
"#;

fn discovered() -> Catalog {
    let graph = load_graph_from_str(GRAPH).unwrap();
    discover(&graph, None).unwrap()
}

// ============================================================================
// Discovery Tests
// ============================================================================

#[test]
fn test_discover_skips_traverse_only_endpoints() {
    let catalog = discovered();
    let ids: Vec<_> = catalog
        .streams
        .iter()
        .map(|e| e.tap_stream_id.as_str())
        .collect();
    assert_eq!(ids, vec!["users", "meetings"]);
}

#[test]
fn test_discover_metadata() {
    let catalog = discovered();
    let users = catalog.get("users").unwrap();

    assert_eq!(users.key_properties, vec!["id"]);
    let root = users.root_metadata().unwrap();
    assert_eq!(root.metadata[TABLE_KEY_PROPERTIES], json!(["id"]));
    assert_eq!(root.metadata[SELECTED_BY_DEFAULT], json!(true));
    assert!(!root.metadata.contains_key(PARENT_TAP_STREAM_ID));

    let id = users
        .metadata
        .iter()
        .find(|m| m.breadcrumb == vec!["properties", "id"])
        .unwrap();
    assert_eq!(id.metadata[INCLUSION], json!("automatic"));

    let email = users
        .metadata
        .iter()
        .find(|m| m.breadcrumb == vec!["properties", "email"])
        .unwrap();
    assert_eq!(email.metadata[INCLUSION], json!("available"));

    let meetings = catalog.get("meetings").unwrap();
    assert_eq!(
        meetings.root_metadata().unwrap().metadata[PARENT_TAP_STREAM_ID],
        json!("list_meetings")
    );
}

#[test]
fn test_discover_falls_back_to_permissive_schema() {
    let catalog = discovered();
    let meetings = catalog.get("meetings").unwrap();
    assert!(meetings.schema.allows_additional());
    assert_eq!(meetings.metadata.len(), 1);
}

#[test]
fn test_discover_reads_schema_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("meetings.json"),
        r#"{"type": "object", "properties": {"uuid": {"type": "string"}, "topic": {"type": "string"}}}"#,
    )
    .unwrap();

    let graph = load_graph_from_str(GRAPH).unwrap();
    let catalog = discover(&graph, Some(dir.path())).unwrap();
    let meetings = catalog.get("meetings").unwrap();

    assert!(meetings.schema.get_property("topic").is_some());
    assert_eq!(meetings.metadata.len(), 3);
}

#[test]
fn test_discover_invalid_schema_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("meetings.json"), "{not json").unwrap();

    let graph = load_graph_from_str(GRAPH).unwrap();
    let err = discover(&graph, Some(dir.path())).unwrap_err();
    assert!(err.to_string().contains("meetings.json"));
}

#[test]
fn test_discover_builtin_zoom() {
    let graph = crate::loader::load_graph("zoom").unwrap();
    let catalog = discover(&graph, None).unwrap();

    assert!(catalog.get("list_meetings").is_none());
    assert!(catalog.get("list_webinars").is_none());
    assert_eq!(catalog.streams.len(), 15);
    assert_eq!(catalog.get("meetings").unwrap().key_properties, vec!["uuid"]);
}

// ============================================================================
// Selection Tests
// ============================================================================

#[test]
fn test_selection_defaults_to_selected_by_default() {
    let catalog = discovered();
    let selection = catalog.selection();
    assert!(selection.contains("users"));
    assert!(selection.contains("meetings"));
    assert_eq!(selection.len(), 2);
}

#[test]
fn test_selected_overrides_default() {
    let mut catalog = discovered();
    catalog.streams[0].set_selected(false);

    let selection = catalog.selection();
    assert!(!selection.contains("users"));
    assert!(selection.contains("meetings"));
}

#[test]
fn test_missing_root_metadata_is_unselected() {
    let catalog = Catalog::from_json(
        r#"{"streams": [{"tap_stream_id": "users", "stream": "users", "schema": {"type": "object"}}]}"#,
    )
    .unwrap();

    assert!(catalog.selection().is_empty());
    assert_eq!(SelectionSet::all(&catalog).len(), 1);
}

#[test]
fn test_select_only() {
    let mut catalog = discovered();
    catalog.select_only(&["meetings"]).unwrap();

    let selection = catalog.selection();
    assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["meetings"]);
}

#[test]
fn test_select_only_unknown_stream() {
    let mut catalog = discovered();
    let err = catalog.select_only(&["nope"]).unwrap_err();
    assert!(matches!(err, crate::error::Error::StreamNotFound { .. }));
}

#[test]
fn test_set_selected_creates_root_metadata() {
    let mut catalog = Catalog::from_json(
        r#"{"streams": [{"tap_stream_id": "users", "stream": "users", "schema": {}}]}"#,
    )
    .unwrap();
    catalog.streams[0].set_selected(true);
    assert!(catalog.selection().contains("users"));
}

// ============================================================================
// Field Exclusion Tests
// ============================================================================

#[test]
fn test_excluded_fields() {
    let catalog = Catalog::from_json(
        &json!({
            "streams": [{
                "tap_stream_id": "users",
                "stream": "users",
                "schema": {"type": "object"},
                "metadata": [
                    {"breadcrumb": [], "metadata": {"selected": true}},
                    {"breadcrumb": ["properties", "id"], "metadata": {"inclusion": "automatic", "selected": false}},
                    {"breadcrumb": ["properties", "email"], "metadata": {"inclusion": "available", "selected": false}},
                    {"breadcrumb": ["properties", "pic_url"], "metadata": {"inclusion": "unsupported"}},
                    {"breadcrumb": ["properties", "dept"], "metadata": {"inclusion": "available", "selected": true}}
                ]
            }]
        })
        .to_string(),
    )
    .unwrap();

    let excluded = catalog.get("users").unwrap().excluded_fields();
    let names: Vec<_> = excluded.iter().map(String::as_str).collect();
    assert_eq!(names, vec!["email", "pic_url"]);
}

#[test]
fn test_catalog_round_trip() {
    let catalog = discovered();
    let json = catalog.to_json_pretty().unwrap();
    let parsed = Catalog::from_json(&json).unwrap();
    assert_eq!(parsed, catalog);
}

#[test]
fn test_catalog_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, discovered().to_json_pretty().unwrap()).unwrap();

    let catalog = Catalog::from_path(&path).unwrap();
    assert_eq!(catalog.streams.len(), 2);

    assert!(Catalog::from_path(dir.path().join("missing.json")).is_err());
}

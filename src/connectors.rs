//! Built-in endpoint graphs embedded in the binary
//!
//! This module embeds the supported graph YAML files directly into the binary,
//! allowing users to use `--endpoints zoom` instead of specifying a file path.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in endpoint graph YAML definitions
pub static BUILTIN_GRAPHS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // Video & Meetings
    m.insert("zoom", include_str!("../connectors/zoom.yaml"));
    m.insert("zoom-v2", include_str!("../connectors/zoom.yaml"));

    m
});

/// Get a built-in graph by name
pub fn get_builtin(name: &str) -> Option<&'static str> {
    BUILTIN_GRAPHS.get(name).copied()
}

/// Check if a name is a built-in graph
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_GRAPHS.contains_key(name)
}

/// List all built-in graph names (primary names only)
pub fn list_builtin() -> Vec<&'static str> {
    vec!["zoom"]
}

/// Graph metadata for display
#[derive(Debug, Clone)]
pub struct ConnectorInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub aliases: &'static [&'static str],
    pub config_schema: &'static [ConfigField],
}

/// Configuration field definition
#[derive(Debug, Clone)]
pub struct ConfigField {
    pub name: &'static str,
    pub field_type: &'static str,
    pub required: bool,
    pub secret: bool,
    pub description: &'static str,
    pub default: Option<&'static str>,
}

/// Get detailed info about all built-in graphs
pub fn list_builtin_info() -> Vec<ConnectorInfo> {
    vec![ConnectorInfo {
        name: "zoom",
        description: "Zoom users, meetings, webinars, registrants, polls and reports",
        category: "Video",
        aliases: &["zoom-v2"],
        config_schema: &[
            ConfigField {
                name: "access_token",
                field_type: "string",
                required: false,
                secret: true,
                description: "Static OAuth access token (alias: jwt)",
                default: None,
            },
            ConfigField {
                name: "client_id",
                field_type: "string",
                required: false,
                secret: false,
                description: "OAuth app client id, used with client_secret and refresh_token",
                default: None,
            },
            ConfigField {
                name: "client_secret",
                field_type: "string",
                required: false,
                secret: true,
                description: "OAuth app client secret",
                default: None,
            },
            ConfigField {
                name: "refresh_token",
                field_type: "string",
                required: false,
                secret: true,
                description: "OAuth refresh token",
                default: None,
            },
            ConfigField {
                name: "api_key",
                field_type: "string",
                required: false,
                secret: false,
                description: "JWT app API key, used with api_secret",
                default: None,
            },
            ConfigField {
                name: "api_secret",
                field_type: "string",
                required: false,
                secret: true,
                description: "JWT app API secret",
                default: None,
            },
            ConfigField {
                name: "base_url",
                field_type: "string",
                required: false,
                secret: false,
                description: "API base URL",
                default: Some("https://api.zoom.us/v2"),
            },
        ],
    }]
}

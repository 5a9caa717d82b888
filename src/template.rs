//! Path template interpolation
//!
//! Endpoint paths carry `{name}` placeholders (e.g. `users/{user_id}/meetings`)
//! resolved from the active [`KeyBag`]. Substituted values are
//! percent-encoded, so a value containing `/` stays one path segment.

use crate::error::{Error, Result};
use crate::keys::KeyBag;
use regex::Regex;
use std::sync::LazyLock;

/// Regex for matching path placeholders: {name}
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}").unwrap());

/// Render a path template for `stream` with values from `bag`
pub fn render_path(template: &str, bag: &KeyBag, stream: &str) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = PLACEHOLDER_REGEX.replace_all(template, |cap: &regex::Captures<'_>| {
        let name = &cap[1];
        if let Some(value) = bag.get_str(name) {
            urlencoding::encode(&value).into_owned()
        } else {
            missing.push(name.to_string());
            String::new()
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::unbound_placeholder(stream, missing.join(", ")))
    }
}

/// Check if a string contains placeholders
pub fn has_placeholders(s: &str) -> bool {
    PLACEHOLDER_REGEX.is_match(s)
}

/// Extract all placeholder names from a template, in order of appearance
pub fn placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_substitution() {
        let bag = KeyBag::new().with("id", 1);
        let result = render_path("/users/{id}/roles", &bag, "roles").unwrap();
        assert_eq!(result, "/users/1/roles");
    }

    #[test]
    fn test_multiple_substitutions() {
        let bag = KeyBag::new()
            .with("user_id", "abc")
            .with("meeting_id", 85_746_065);

        let result = render_path("users/{user_id}/meetings/{meeting_id}", &bag, "m").unwrap();
        assert_eq!(result, "users/abc/meetings/85746065");
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let bag = KeyBag::new().with("meeting_uuid", "/ab//c+d==");
        let result =
            render_path("report/meetings/{meeting_uuid}/participants", &bag, "p").unwrap();
        assert_eq!(result, "report/meetings/%2Fab%2F%2Fc%2Bd%3D%3D/participants");
    }

    #[test]
    fn test_repeated_placeholder() {
        let bag = KeyBag::new().with("id", "x");
        assert_eq!(render_path("{id}/{id}", &bag, "s").unwrap(), "x/x");
    }

    #[test]
    fn test_unbound_placeholder() {
        let bag = KeyBag::new();
        let err = render_path("meetings/{meeting_id}/polls", &bag, "meeting_polls").unwrap_err();
        assert!(matches!(
            err,
            Error::UnboundPlaceholder { ref stream, ref placeholder }
                if stream == "meeting_polls" && placeholder == "meeting_id"
        ));
    }

    #[test]
    fn test_no_placeholders() {
        let bag = KeyBag::new().with("unused", 1);
        assert_eq!(render_path("users", &bag, "users").unwrap(), "users");
    }

    #[test]
    fn test_whitespace_in_placeholder() {
        let bag = KeyBag::new().with("id", 3);
        assert_eq!(render_path("a/{ id }", &bag, "s").unwrap(), "a/3");
    }

    #[test]
    fn test_has_placeholders() {
        assert!(has_placeholders("users/{user_id}"));
        assert!(!has_placeholders("users"));
        assert!(!has_placeholders("{{}}"));
    }

    #[test]
    fn test_placeholders() {
        let names = placeholders("report/{meeting_uuid}/x/{user_id}");
        assert_eq!(names, vec!["meeting_uuid", "user_id"]);
    }
}

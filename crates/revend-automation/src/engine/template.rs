//! Placeholder interpolation for action parameters.
//!
//! Templates use `{{field.path}}` placeholders resolved against the
//! event snapshot's current values. Unresolvable placeholders render as
//! empty strings so a half-filled message is still delivered.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use revend_core::EventSnapshot;
use serde_json::Value;

/// Matches `{{path}}` placeholders, capturing the inner path.
///
/// Compiled once and reused across renders.
fn placeholder_regex() -> Option<&'static Regex> {
    static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").ok())
        .as_ref()
}

/// Renders `{{path}}` placeholders in a template against a snapshot.
pub(crate) fn render(template: &str, snapshot: &EventSnapshot) -> String {
    let Some(pattern) = placeholder_regex() else {
        return template.to_owned();
    };

    pattern
        .replace_all(template, |caps: &Captures<'_>| {
            caps.get(1)
                .and_then(|path| snapshot.lookup(path.as_str().trim()))
                .map(render_value)
                .unwrap_or_default()
        })
        .into_owned()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

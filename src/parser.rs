//! Recovery of reply suggestions from free-form model output.
//!
//! Models are told to answer with a bare JSON array, but regularly wrap it in
//! prose or markdown fences. Strategies run in order and the first one that
//! yields anything wins:
//!
//! 1. the whole trimmed text as a JSON array,
//! 2. the first `[...]` span (shortest match) as a JSON array,
//! 3. the first three double-quoted strings, if there are at least three.
//!
//! Anything else yields an empty list.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::MAX_SUGGESTIONS;

static ARRAY_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[\s\S]*?\]").expect("array pattern is valid"));
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("quoted pattern is valid"));

/// Extracts at most three trimmed suggestions from raw completion text.
pub fn parse_suggestions(raw: &str) -> Vec<String> {
    let cleaned = raw.trim();

    if let Some(suggestions) = parse_json_array(cleaned) {
        return suggestions;
    }

    if let Some(span) = ARRAY_SPAN.find(cleaned) {
        if let Some(suggestions) = parse_json_array(span.as_str()) {
            debug!("recovered suggestions from embedded array");
            return suggestions;
        }
    }

    let quoted: Vec<&str> = QUOTED
        .captures_iter(cleaned)
        .filter_map(|captures| captures.get(1))
        .map(|inner| inner.as_str())
        .take(MAX_SUGGESTIONS)
        .collect();
    if quoted.len() >= MAX_SUGGESTIONS {
        debug!("recovered suggestions from quoted strings");
        return quoted.into_iter().map(|text| text.trim().to_string()).collect();
    }

    warn!(raw = %cleaned, "failed to parse model output");
    Vec::new()
}

fn parse_json_array(text: &str) -> Option<Vec<String>> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) else {
        return None;
    };
    if items.is_empty() {
        return None;
    }
    Some(
        items
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|item| stringify(item).trim().to_string())
            .collect(),
    )
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

//! Structural content generation.
//!
//! Rebuilds a template value container-for-container, applying a leaf
//! transform at each scalar. The output has the exact shape of the input:
//! same nesting, same array lengths, same key sets. The template itself is
//! never mutated -- every call works on a fresh rebuild.

use serde_json::Value;

/// Walk `template`, applying `leaf` to the text form of every scalar leaf.
///
/// Leaves come back as strings; the cast post-processor restores other types
/// where the specification asks for them.
pub fn generate_content(template: &Value, leaf: &dyn Fn(&str) -> String) -> Value {
    match template {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| generate_content(item, leaf))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), generate_content(v, leaf)))
                .collect(),
        ),
        scalar => Value::String(leaf(&scalar_text(scalar))),
    }
}

/// Text form of a scalar template leaf.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

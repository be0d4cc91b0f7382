//! Placeholder interpretation.
//!
//! Substitutes `{token}` placeholders with concrete values from the request
//! context. The filler stage runs before this on the same string, so
//! `{{category.field}}` forms have already been consumed; whatever single-
//! brace tokens remain are resolved here, and unresolved tokens pass through
//! verbatim.

use serde_json::Value;

use mimus_core::capture::capture;

use crate::context::RequestContext;

/// Resolve every placeholder in `text` against the context.
///
/// Tokens are snapshotted from the original text before any substitution, so
/// braces inside substituted values are never re-captured. Each captured
/// occurrence replaces the first remaining literal `{token}` left to right;
/// repeated tokens are therefore each replaced independently. With
/// `fold_case` the token is lowercased before lookup (header templates).
pub fn interpret(text: &str, ctx: &RequestContext, fold_case: bool) -> String {
    let tokens: Vec<String> = capture(text).map(str::to_string).collect();
    let mut out = text.to_string();
    for token in tokens {
        let key = if fold_case {
            token.to_ascii_lowercase()
        } else {
            token.clone()
        };
        if let Some(found) = ctx.lookup(&key) {
            let needle = format!("{{{token}}}");
            out = out.replacen(&needle, &render(&found), 1);
        }
    }
    out
}

/// Canonical text form of a resolved value: strings verbatim, numbers and
/// booleans canonical, arrays comma-joined, objects compact JSON.
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render)
            .collect::<Vec<String>>()
            .join(","),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

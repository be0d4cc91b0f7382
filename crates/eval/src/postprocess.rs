//! Post-generation transforms: `repeat` and `cast`.
//!
//! The orchestrator applies repeat strictly before cast, so cast paths that
//! address array elements by wildcard operate on the post-expansion array.

use rand::Rng;
use serde_json::Value;

use mimus_core::spec::{CastKind, RepeatFormula};

/// Expand a list's cardinality: `count` whole copies of the original list
/// concatenated (wholesale replication, not element-wise).
///
/// For a range formula the count is drawn uniformly in `[min, max]`
/// inclusive, with an omitted bound defaulting to the original list length.
/// A count of zero yields an empty list. Bound validity was settled at load
/// time; nothing here can fail.
pub fn repeat(list: &[Value], formula: &RepeatFormula) -> Vec<Value> {
    let count = match formula {
        RepeatFormula::Count(n) => *n,
        RepeatFormula::Range { min, max } => {
            let len = list.len() as u64;
            let lo = min.unwrap_or(len);
            let hi = max.unwrap_or(len);
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            rand::thread_rng().gen_range(lo..=hi)
        }
    };
    let mut out = Vec::with_capacity(list.len() * count as usize);
    for _ in 0..count {
        out.extend_from_slice(list);
    }
    out
}

/// Coerce a generated value to the requested kind.
///
/// Failures are soft: an absent or unparseable input yields a conspicuous
/// diagnostic string in place of the target, never an error. Unsupported
/// kinds were rejected at load time.
pub fn cast(kind: CastKind, value: Option<&Value>) -> Value {
    let Some(value) = value else {
        return diagnostic("no value to cast");
    };
    match kind {
        CastKind::Number => cast_number(value),
        CastKind::Boolean => cast_boolean(value),
        CastKind::String => cast_string(value),
    }
}

fn cast_number(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => {
            if let Ok(i) = s.trim().parse::<i64>() {
                return Value::from(i);
            }
            match s.trim().parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                Some(n) => Value::Number(n),
                None => diagnostic(&format!("'{}' is not a number", s)),
            }
        }
        other => diagnostic(&format!("'{}' is not a number", other)),
    }
}

fn cast_boolean(value: &Value) -> Value {
    match value {
        Value::Bool(_) => value.clone(),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Value::Bool(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Value::Bool(false),
        Value::String(s) => diagnostic(&format!("'{}' is not a boolean", s)),
        other => diagnostic(&format!("'{}' is not a boolean", other)),
    }
}

fn cast_string(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        // Display for Value is compact JSON, which doubles as the canonical
        // string form for containers.
        other => Value::String(other.to_string()),
    }
}

fn diagnostic(message: &str) -> Value {
    Value::String(format!("[cast error: {}]", message))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list3() -> Vec<Value> {
        vec![json!("a"), json!("b"), json!("c")]
    }

    #[test]
    fn repeat_count_concatenates_whole_copies() {
        let out = repeat(&list3(), &RepeatFormula::Count(5));
        assert_eq!(out.len(), 15);
        assert_eq!(out[0], json!("a"));
        assert_eq!(out[3], json!("a"));
        assert_eq!(out[5], json!("c"));
    }

    #[test]
    fn repeat_zero_yields_empty_list() {
        assert!(repeat(&list3(), &RepeatFormula::Count(0)).is_empty());
    }

    #[test]
    fn repeat_range_stays_within_bounds() {
        let formula = RepeatFormula::Range {
            min: Some(5),
            max: Some(10),
        };
        for _ in 0..50 {
            let count = repeat(&list3(), &formula).len() / 3;
            assert!((5..=10).contains(&count), "count {count} out of range");
        }
    }

    #[test]
    fn repeat_open_bounds_default_to_list_length() {
        let formula = RepeatFormula::Range {
            min: None,
            max: Some(3),
        };
        for _ in 0..50 {
            let count = repeat(&list3(), &formula).len() / 3;
            assert!((3..=3).contains(&count));
        }
    }

    #[test]
    fn cast_number_parses_integers_and_floats() {
        assert_eq!(cast(CastKind::Number, Some(&json!("100"))), json!(100));
        assert_eq!(cast(CastKind::Number, Some(&json!("2.5"))), json!(2.5));
        assert_eq!(cast(CastKind::Number, Some(&json!(7))), json!(7));
    }

    #[test]
    fn cast_boolean_accepts_literal_true_false_only() {
        assert_eq!(cast(CastKind::Boolean, Some(&json!("true"))), json!(true));
        assert_eq!(cast(CastKind::Boolean, Some(&json!("FALSE"))), json!(false));
        let diag = cast(CastKind::Boolean, Some(&json!("100")));
        let text = diag.as_str().unwrap();
        assert!(text.starts_with("[cast error:"), "got {text}");
    }

    #[test]
    fn cast_number_failure_is_diagnostic_not_error() {
        let diag = cast(CastKind::Number, Some(&json!("not a number")));
        assert_eq!(diag, json!("[cast error: 'not a number' is not a number]"));
    }

    #[test]
    fn cast_absent_value_is_diagnostic() {
        assert_eq!(cast(CastKind::Number, None), json!("[cast error: no value to cast]"));
    }

    #[test]
    fn cast_string_gives_canonical_forms() {
        assert_eq!(cast(CastKind::String, Some(&json!(2.5))), json!("2.5"));
        assert_eq!(cast(CastKind::String, Some(&json!(true))), json!("true"));
        assert_eq!(cast(CastKind::String, Some(&json!(["a", 1]))), json!("[\"a\",1]"));
    }
}

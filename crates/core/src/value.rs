//! Dotted-path addressing over JSON values.
//!
//! The same path grammar is used everywhere a value is addressed: placeholder
//! interpretation, cast targets, and predicate field access. A path is a
//! dot-separated list of segments; the segment `*` distributes over every
//! element of an array. Traversal is slice-based recursion -- the path is
//! never consumed destructively.

use serde_json::Value;

/// Wildcard path segment matching every element of an array.
pub const WILDCARD: &str = "*";

/// Errors raised by loud traversal failures in [`set`].
///
/// `get` never errors -- a lookup that cannot proceed is simply missing.
/// `set` must not silently invent structure, so traversing through a missing
/// or non-container intermediate segment fails here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// An intermediate segment does not exist. Only terminal keys may be
    /// created by `set`.
    #[error("missing intermediate segment '{segment}'")]
    MissingSegment { segment: String },

    /// A segment was applied to a scalar.
    #[error("segment '{segment}' applied to non-container value ({type_name})")]
    NotAContainer {
        segment: String,
        type_name: &'static str,
    },

    /// The wildcard segment was applied to something other than an array.
    #[error("wildcard segment applied to non-array value ({type_name})")]
    WildcardOnNonArray { type_name: &'static str },

    /// A numeric segment indexed past the end of an array.
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Split a dotted path into segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('.').collect()
}

/// Human-readable type name for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A value that counts as "missing" for lookup purposes.
///
/// Missing keys and present-but-falsy values are deliberately equivalent:
/// null, false, 0, and the empty string all read as absent. Empty containers
/// do not.
fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Look up a dotted path in a value.
///
/// Returns `None` when any hop is missing (or falsy, see [`is_missing`]).
/// The wildcard recurses over every array element with the remaining path,
/// collecting the non-missing results into a new array in element order.
/// A scalar reached mid-path is returned directly, native type preserved.
pub fn get(value: &Value, path: &str) -> Option<Value> {
    get_at(value, &segments(path))
}

/// Slice-based worker behind [`get`].
pub fn get_at(value: &Value, segs: &[&str]) -> Option<Value> {
    let Some((seg, rest)) = segs.split_first() else {
        return Some(value.clone());
    };

    if *seg == WILDCARD {
        if let Value::Array(items) = value {
            let collected: Vec<Value> = items
                .iter()
                .filter_map(|item| get_at(item, rest))
                .collect();
            return Some(Value::Array(collected));
        }
        return None;
    }

    let looked_up = match value {
        Value::Object(map) => map.get(*seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }?;

    if is_missing(looked_up) {
        return None;
    }
    match looked_up {
        Value::Object(_) | Value::Array(_) => get_at(looked_up, rest),
        scalar => Some(scalar.clone()),
    }
}

/// Strict structural existence check, used at normalization time.
///
/// Unlike [`get`] this does not treat falsy values as missing: a cast target
/// holding `""` or `0` still exists. A wildcard segment resolves when the
/// current value is an array (distribution over zero elements is a no-op).
pub fn resolve(value: &Value, path: &str) -> bool {
    resolve_at(value, &segments(path))
}

fn resolve_at(value: &Value, segs: &[&str]) -> bool {
    let Some((seg, rest)) = segs.split_first() else {
        return true;
    };
    if *seg == WILDCARD {
        return match value {
            Value::Array(items) => items.iter().all(|item| resolve_at(item, rest)),
            _ => false,
        };
    }
    let looked_up = match value {
        Value::Object(map) => map.get(*seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    };
    match looked_up {
        Some(v) => resolve_at(v, rest),
        None => false,
    }
}

/// Apply `transform` at a dotted path, writing the result in place.
///
/// At path exhaustion the current value (or `None` for an absent terminal
/// key) is passed to `transform` and replaced by its result. A missing
/// *terminal* key is created; a missing intermediate segment is a
/// [`PathError`] -- structure is never auto-created mid-path. The wildcard
/// distributes the write over every array element.
pub fn set(
    value: &mut Value,
    path: &str,
    transform: &dyn Fn(Option<&Value>) -> Value,
) -> Result<(), PathError> {
    set_at(value, &segments(path), transform)
}

fn set_at(
    value: &mut Value,
    segs: &[&str],
    transform: &dyn Fn(Option<&Value>) -> Value,
) -> Result<(), PathError> {
    let Some((seg, rest)) = segs.split_first() else {
        *value = transform(Some(&value.clone()));
        return Ok(());
    };

    if *seg == WILDCARD {
        let Value::Array(items) = value else {
            return Err(PathError::WildcardOnNonArray {
                type_name: type_name(value),
            });
        };
        for item in items.iter_mut() {
            set_at(item, rest, transform)?;
        }
        return Ok(());
    }

    if rest.is_empty() {
        // Terminal segment: the one place where a missing key may be created.
        match value {
            Value::Object(map) => {
                let next = transform(map.get(*seg));
                map.insert((*seg).to_string(), next);
                Ok(())
            }
            Value::Array(items) => {
                let index = seg.parse::<usize>().map_err(|_| PathError::NotAContainer {
                    segment: (*seg).to_string(),
                    type_name: "array",
                })?;
                let len = items.len();
                let slot = items
                    .get_mut(index)
                    .ok_or(PathError::IndexOutOfBounds { index, len })?;
                *slot = transform(Some(&slot.clone()));
                Ok(())
            }
            other => Err(PathError::NotAContainer {
                segment: (*seg).to_string(),
                type_name: type_name(other),
            }),
        }
    } else {
        let next = match value {
            Value::Object(map) => map.get_mut(*seg).ok_or(PathError::MissingSegment {
                segment: (*seg).to_string(),
            })?,
            Value::Array(items) => {
                let index = seg.parse::<usize>().map_err(|_| PathError::NotAContainer {
                    segment: (*seg).to_string(),
                    type_name: "array",
                })?;
                let len = items.len();
                items
                    .get_mut(index)
                    .ok_or(PathError::IndexOutOfBounds { index, len })?
            }
            other => {
                return Err(PathError::NotAContainer {
                    segment: (*seg).to_string(),
                    type_name: type_name(other),
                })
            }
        };
        set_at(next, rest, transform)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

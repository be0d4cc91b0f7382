//! Contract normalization.
//!
//! Validates a raw specification document once at load time and produces the
//! immutable [`MockSpec`] consumed by the engine. Everything that can be
//! checked up front is checked here, so the request path never revalidates:
//! method and cast kinds become closed enums, headers become deduplicated
//! sets, predicates are compiled, repeat formulas are parsed, and cast
//! targets are resolved against the data template.

use serde_json::Value;

use crate::error::SpecError;
use crate::headers::HeaderSet;
use crate::predicate;
use crate::spec::{
    CastKind, ExceptCase, Method, MockSpec, RawDocument, RawExceptCase, RawResponse,
    RepeatFormula, RequestSpec, ResponseSpec,
};
use crate::value;

/// Parse and normalize a specification document from JSON text.
pub fn from_str(text: &str) -> Result<MockSpec, SpecError> {
    let raw: RawDocument = serde_json::from_str(text).map_err(|e| SpecError::Document {
        message: e.to_string(),
    })?;
    normalize(raw)
}

/// Normalize an already-deserialized specification document.
pub fn from_json(doc: Value) -> Result<MockSpec, SpecError> {
    let raw: RawDocument = serde_json::from_value(doc).map_err(|e| SpecError::Document {
        message: e.to_string(),
    })?;
    normalize(raw)
}

/// Validate a raw document and produce the normalized specification.
pub fn normalize(raw: RawDocument) -> Result<MockSpec, SpecError> {
    let route = raw.request.route.trim();
    if route.is_empty() {
        return Err(SpecError::EmptyRoute);
    }
    let method = Method::parse(&raw.request.method).ok_or_else(|| SpecError::UnsupportedMethod {
        method: raw.request.method.clone(),
    })?;
    if matches!(raw.request.payload, Some(Value::Array(_))) {
        return Err(SpecError::ArrayPayload);
    }

    let request = RequestSpec {
        route: route.to_string(),
        method,
        query: raw.request.query,
        payload: raw.request.payload,
        headers: headers_from_map(&raw.request.headers)?,
    };

    let response = normalize_response(raw.response)?;

    let mut except = Vec::with_capacity(raw.except.len());
    for (name, body) in raw.except {
        let raw_case: RawExceptCase =
            serde_json::from_value(body).map_err(|e| SpecError::BadExceptCase {
                case: name.clone(),
                message: e.to_string(),
            })?;
        let mut predicates = Vec::with_capacity(raw_case.validate.len());
        for source in &raw_case.validate {
            let compiled = predicate::parse(source).map_err(|e| SpecError::BadPredicate {
                case: name.clone(),
                message: e.to_string(),
            })?;
            predicates.push(compiled);
        }
        except.push(ExceptCase {
            name,
            predicates,
            response: normalize_response(raw_case.response)?,
        });
    }

    Ok(MockSpec {
        request,
        response,
        except,
    })
}

fn normalize_response(raw: RawResponse) -> Result<ResponseSpec, SpecError> {
    if !(100..=599).contains(&raw.code) {
        return Err(SpecError::CodeOutOfRange { code: raw.code });
    }
    let headers = headers_from_map(&raw.headers)?;

    let meta = raw.meta.unwrap_or_default();

    let repeat = match &meta.repeat {
        Some(formula) => {
            if !raw.data.is_array() {
                return Err(SpecError::RepeatOnNonArray);
            }
            Some(parse_repeat(formula)?)
        }
        None => None,
    };

    let mut cast = Vec::with_capacity(meta.cast.len());
    for (path, kind_value) in &meta.cast {
        let kind_name = kind_value.as_str().unwrap_or_default();
        let kind = CastKind::parse(kind_name).ok_or_else(|| SpecError::UnsupportedCastKind {
            path: path.clone(),
            kind: kind_name.to_string(),
        })?;
        if !value::resolve(&raw.data, path) {
            return Err(SpecError::CastTargetMissing { path: path.clone() });
        }
        cast.push((path.clone(), kind));
    }

    Ok(ResponseSpec {
        code: raw.code as u16,
        headers,
        data: raw.data,
        repeat,
        cast,
    })
}

/// Header template values must be scalars; they are stringified here and
/// treated as leaf templates at generation time.
fn headers_from_map(map: &serde_json::Map<String, Value>) -> Result<HeaderSet, SpecError> {
    let mut pairs = Vec::with_capacity(map.len());
    for (name, v) in map {
        let text = match v {
            Value::String(s) => s.clone(),
            Value::Bool(_) | Value::Number(_) => v.to_string(),
            _ => {
                return Err(SpecError::Document {
                    message: format!("header '{}' must be a scalar", name),
                })
            }
        };
        pairs.push((name.clone(), text));
    }
    HeaderSet::from_pairs(pairs)
}

/// Upper bound on repeat counts and range bounds. A count past this is a
/// load error; the output allocation scales with the count, so pathological
/// documents must be rejected before they reach the request path.
pub const MAX_REPEAT_COUNT: u64 = 10_000;

fn parse_repeat(formula: &Value) -> Result<RepeatFormula, SpecError> {
    let bad = |message: &str| SpecError::BadRepeatFormula {
        formula: formula.to_string(),
        message: message.to_string(),
    };
    let checked = |count: u64| -> Result<u64, SpecError> {
        if count > MAX_REPEAT_COUNT {
            return Err(bad(&format!("count must not exceed {}", MAX_REPEAT_COUNT)));
        }
        Ok(count)
    };

    match formula {
        Value::Number(n) => {
            let count = n.as_u64().ok_or_else(|| bad("count must be a non-negative integer"))?;
            Ok(RepeatFormula::Count(checked(count)?))
        }
        Value::String(s) => {
            let s = s.trim();
            if let Some((min_text, max_text)) = s.split_once("..") {
                let parse_bound = |text: &str| -> Result<Option<u64>, SpecError> {
                    let text = text.trim();
                    if text.is_empty() {
                        return Ok(None);
                    }
                    let bound = text
                        .parse::<u64>()
                        .map_err(|_| bad("range bounds must be non-negative integers"))?;
                    Ok(Some(checked(bound)?))
                };
                let min = parse_bound(min_text)?;
                let max = parse_bound(max_text)?;
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(bad("range minimum exceeds maximum"));
                    }
                }
                Ok(RepeatFormula::Range { min, max })
            } else {
                let count = s
                    .parse::<u64>()
                    .map_err(|_| bad("count must be a non-negative integer"))?;
                Ok(RepeatFormula::Count(checked(count)?))
            }
        }
        _ => Err(bad("expected an integer or a 'min..max' string")),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

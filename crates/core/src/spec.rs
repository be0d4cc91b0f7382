//! Specification document types.
//!
//! [`RawDocument`] is the serde-facing shape of a specification file:
//!
//! ```json
//! {
//!   "request":  { "route": "/users/:id", "method": "GET",
//!                 "query": {}, "payload": {}, "headers": {} },
//!   "response": { "code": 200, "headers": {}, "data": ...,
//!                 "$data": { "cast": { "path": "number" }, "repeat": "5..10" } },
//!   "except":   { "<case name>": { "validate": ["..."], "response": {...} } }
//! }
//! ```
//!
//! The normalized types ([`MockSpec`] and friends) are produced once by
//! [`crate::normalize`] and never mutated afterwards: route patterns are
//! checked, methods are a closed enum, headers are deduplicated
//! [`HeaderSet`]s, predicates are compiled ASTs, and repeat/cast metadata is
//! parsed. Except case order and template key order are preserved from the
//! document (`serde_json` runs with `preserve_order`).

use serde::Deserialize;
use serde_json::Value;

use crate::headers::HeaderSet;
use crate::predicate::Predicate;

// ──────────────────────────────────────────────
// Raw document (serde shape)
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDocument {
    pub request: RawRequest,
    pub response: RawResponse,
    /// Case name -> raw case body. Declaration order is load-bearing.
    #[serde(default)]
    pub except: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRequest {
    pub route: String,
    pub method: String,
    #[serde(default)]
    pub query: serde_json::Map<String, Value>,
    pub payload: Option<Value>,
    #[serde(default)]
    pub headers: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawResponse {
    pub code: i64,
    #[serde(default)]
    pub headers: serde_json::Map<String, Value>,
    pub data: Value,
    /// Post-generation metadata.
    #[serde(default, rename = "$data")]
    pub meta: Option<RawMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawMeta {
    /// Path -> cast kind name. Order preserved.
    #[serde(default)]
    pub cast: serde_json::Map<String, Value>,
    /// Literal count (number or numeric string) or a "min..max" range.
    pub repeat: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawExceptCase {
    pub validate: Vec<String>,
    pub response: RawResponse,
}

// ──────────────────────────────────────────────
// Normalized specification
// ──────────────────────────────────────────────

/// Supported HTTP verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn parse(s: &str) -> Option<Method> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

/// Normalized request shape: the contract's expectations plus per-field
/// defaults merged into every live request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// Route pattern, optionally containing `:name` parameter segments.
    pub route: String,
    pub method: Method,
    /// Default query values, overridden by live query parameters.
    pub query: serde_json::Map<String, Value>,
    /// Default payload, shallow-merged under the live body. Never an array.
    pub payload: Option<Value>,
    /// Default headers, overridden by live request headers.
    pub headers: HeaderSet,
}

/// Type coercions applicable at a cast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    Number,
    Boolean,
    String,
}

impl CastKind {
    pub fn parse(s: &str) -> Option<CastKind> {
        match s {
            "number" => Some(CastKind::Number),
            "boolean" => Some(CastKind::Boolean),
            "string" => Some(CastKind::String),
            _ => None,
        }
    }
}

/// Cardinality formula for the `repeat` post-processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatFormula {
    /// Exact number of whole-list copies.
    Count(u64),
    /// Uniform draw in `[min, max]`; an omitted bound defaults to the
    /// original list length at application time.
    Range { min: Option<u64>, max: Option<u64> },
}

/// Normalized response template.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    pub code: u16,
    pub headers: HeaderSet,
    /// Data template; generation always works on a fresh copy.
    pub data: Value,
    pub repeat: Option<RepeatFormula>,
    /// Cast operations in declaration order, applied after repeat.
    pub cast: Vec<(String, CastKind)>,
}

/// A named override case: if any predicate fails, this case's response
/// replaces the default.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptCase {
    pub name: String,
    /// Compiled predicates in declaration order.
    pub predicates: Vec<Predicate>,
    pub response: ResponseSpec,
}

/// A fully normalized, immutable mock specification.
#[derive(Debug, Clone, PartialEq)]
pub struct MockSpec {
    pub request: RequestSpec,
    pub response: ResponseSpec,
    /// Override cases in declaration order; first failure wins.
    pub except: Vec<ExceptCase>,
}

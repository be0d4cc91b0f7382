//! Per-request context assembly.
//!
//! A [`RequestContext`] is built fresh for every call by merging the
//! specification's defaults with the live request, and is read-only for the
//! rest of the pipeline. Shape:
//!
//! ```json
//! {
//!   "route":   { "<param>": "<value>" },
//!   "query":   { spec defaults, live values win },
//!   "headers": { lowercased, live values win },
//!   "payload": { spec default shallow-merged under live body },
//!   "time":    "<RFC 3339 timestamp>"
//! }
//! ```

use serde_json::{Map, Value};

use mimus_core::headers::HeaderSet;
use mimus_core::spec::RequestSpec;
use mimus_core::value;

/// The live half of a request, as delivered by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct LiveRequest {
    /// Route parameters extracted from the matched `:name` segments.
    pub params: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// Parsed JSON body, if any.
    pub payload: Option<Value>,
}

impl LiveRequest {
    pub fn new() -> Self {
        LiveRequest::default()
    }
}

/// Read-only lookup snapshot for one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    root: Value,
}

/// Context fields visible to override predicates. `time` is excluded so
/// override selection stays deterministic for a given request.
const PREDICATE_ROOTS: [&str; 4] = ["route", "query", "headers", "payload"];

impl RequestContext {
    /// Merge spec defaults with live values and stamp the current time.
    pub fn build(spec: &RequestSpec, live: &LiveRequest) -> RequestContext {
        let mut route = Map::new();
        for (name, v) in &live.params {
            route.insert(name.clone(), Value::String(v.clone()));
        }

        let mut query = spec.query.clone();
        for (name, v) in &live.query {
            query.insert(name.clone(), Value::String(v.clone()));
        }

        let mut live_headers = HeaderSet::new();
        for (name, v) in &live.headers {
            live_headers.set(name, v);
        }
        let mut headers = Map::new();
        for (name, v) in spec.headers.merge(&live_headers).iter() {
            headers.insert(name.to_ascii_lowercase(), Value::String(v.to_string()));
        }

        let payload = merge_payload(spec.payload.as_ref(), live.payload.as_ref());

        let mut root = Map::new();
        root.insert("route".to_string(), Value::Object(route));
        root.insert("query".to_string(), Value::Object(query));
        root.insert("headers".to_string(), Value::Object(headers));
        root.insert("payload".to_string(), payload);
        root.insert("time".to_string(), Value::String(timestamp()));
        RequestContext {
            root: Value::Object(root),
        }
    }

    /// Path lookup over the full context (placeholder interpretation).
    pub fn lookup(&self, path: &str) -> Option<Value> {
        value::get(&self.root, path)
    }

    /// Path lookup restricted to the fields predicates may observe.
    pub fn lookup_for_predicate(&self, path: &str) -> Option<Value> {
        let root_segment = path.split('.').next().unwrap_or("");
        if !PREDICATE_ROOTS.contains(&root_segment) {
            return None;
        }
        self.lookup(path)
    }
}

/// Live payload keys win over spec defaults; a non-object live body replaces
/// the default wholesale.
fn merge_payload(default: Option<&Value>, live: Option<&Value>) -> Value {
    match (default, live) {
        (Some(Value::Object(base)), Some(Value::Object(overlay))) => {
            let mut merged = base.clone();
            for (k, v) in overlay {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        (_, Some(live)) => live.clone(),
        (Some(default), None) => default.clone(),
        (None, None) => Value::Object(Map::new()),
    }
}

fn timestamp() -> String {
    let now = time::OffsetDateTime::now_utc();
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

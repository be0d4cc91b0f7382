//! mimus-eval: the Mimus response generation engine.
//!
//! Consumes a normalized [`MockSpec`] and a per-call [`LiveRequest`], and
//! produces a [`GeneratedResponse`]. Pure synchronous computation: the
//! engine owns no sockets, files, or process state, and every call works on
//! a fresh context and a fresh rebuild of the response template. Specs are
//! immutable and safely shared across concurrent requests.
//!
//! Pipeline per request:
//! 1. build the [`RequestContext`] (spec defaults merged with live values)
//! 2. run override selection over the except cases
//! 3. pick the winning response template (override's or default's)
//! 4. structural generation with a leaf transform of filler-then-interpret
//!    (header lookups fold case, data lookups do not)
//! 5. apply `repeat`, then `cast`
//!
//! The filler is an opaque host-supplied function from template string to
//! string; the engine never inspects what it generates.

pub mod context;
pub mod except;
pub mod generate;
pub mod interpret;
pub mod postprocess;

pub use context::{LiveRequest, RequestContext};
pub use except::Outcome;
pub use generate::generate_content;
pub use interpret::interpret;

use serde_json::Value;

use mimus_core::spec::MockSpec;
use mimus_core::value::{self, PathError};

/// Response header recording which override case fired.
pub const ASSERTION_HEADER: &str = "x-mimus-assertion";

/// The concrete response computed for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedResponse {
    pub code: u16,
    pub headers: Vec<(String, String)>,
    pub content: Value,
    /// Name of the override case that fired, if any.
    pub flow: Option<String>,
    /// Why the firing predicate errored, when it fired on an evaluation
    /// error rather than a non-true result. For operational logging.
    pub flow_reason: Option<String>,
}

/// Run the full generation pipeline for one request.
///
/// The only error source is a cast path failing structural traversal at
/// request time; normalization resolves cast targets up front, so this is
/// unreachable for well-formed specs but still fails loudly rather than
/// silently inventing structure.
pub fn generate(
    spec: &MockSpec,
    live: &LiveRequest,
    filler: &dyn Fn(&str) -> String,
) -> Result<GeneratedResponse, PathError> {
    let ctx = RequestContext::build(&spec.request, live);

    let (response, flow, flow_reason) = match except::select(&spec.except, &ctx) {
        Some((case, reason)) => (&case.response, Some(case.name.clone()), reason),
        None => (&spec.response, None, None),
    };

    let mut headers: Vec<(String, String)> = response
        .headers
        .iter()
        .map(|(name, template)| {
            (
                name.to_string(),
                interpret(&filler(template), &ctx, true),
            )
        })
        .collect();
    if let Some(name) = &flow {
        headers.push((ASSERTION_HEADER.to_string(), name.clone()));
    }

    let mut content = generate_content(&response.data, &|leaf| {
        interpret(&filler(leaf), &ctx, false)
    });

    if let Some(formula) = &response.repeat {
        if let Value::Array(items) = &content {
            content = Value::Array(postprocess::repeat(items, formula));
        }
    }

    for (path, kind) in &response.cast {
        value::set(&mut content, path, &|current| {
            postprocess::cast(*kind, current)
        })?;
    }

    Ok(GeneratedResponse {
        code: response.code,
        headers,
        content,
        flow,
        flow_reason,
    })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

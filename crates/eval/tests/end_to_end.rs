//! End-to-end engine tests: specification document in, generated response
//! out, through normalization and the full pipeline.

use mimus_core::normalize;
use mimus_core::spec::MockSpec;
use mimus_eval::{generate, GeneratedResponse, LiveRequest, ASSERTION_HEADER};
use serde_json::{json, Value};

fn spec(doc: Value) -> MockSpec {
    normalize::from_json(doc).unwrap()
}

fn run(spec: &MockSpec, live: &LiveRequest) -> GeneratedResponse {
    generate(spec, live, &|s: &str| s.to_string()).unwrap()
}

#[test]
fn route_params_and_query_defaults_flow_into_data() {
    let spec = spec(json!({
        "request": {
            "route": "/users/:id",
            "method": "GET",
            "query": {"expand": "none"}
        },
        "response": {
            "code": 200,
            "data": {"id": "{route.id}", "expand": "{query.expand}"}
        }
    }));
    let live = LiveRequest {
        params: vec![("id".to_string(), "42".to_string())],
        ..LiveRequest::new()
    };
    let out = run(&spec, &live);
    assert_eq!(out.content, json!({"id": "42", "expand": "none"}));

    let live = LiveRequest {
        params: vec![("id".to_string(), "42".to_string())],
        query: vec![("expand".to_string(), "full".to_string())],
        ..LiveRequest::new()
    };
    assert_eq!(run(&spec, &live).content, json!({"id": "42", "expand": "full"}));
}

#[test]
fn override_cases_fire_in_declaration_order() {
    let spec = spec(json!({
        "request": {"route": "/orders", "method": "POST"},
        "response": {"code": 201, "data": "created"},
        "except": {
            "Body is required": {
                "validate": ["size(payload) > 0"],
                "response": {"code": 400, "data": {"error": "empty body"}}
            },
            "Status must be valid": {
                "validate": ["payload.status == 'open' || payload.status == 'closed'"],
                "response": {"code": 422, "data": {"error": "bad status"}}
            }
        }
    }));

    // empty body: first case fires, second never evaluated
    let out = run(&spec, &LiveRequest::new());
    assert_eq!(out.code, 400);
    assert_eq!(out.flow.as_deref(), Some("Body is required"));

    // non-empty body with a bad status: second case fires
    let live = LiveRequest {
        payload: Some(json!({"status": "weird"})),
        ..LiveRequest::new()
    };
    let out = run(&spec, &live);
    assert_eq!(out.code, 422);
    assert_eq!(out.flow.as_deref(), Some("Status must be valid"));
    assert!(out
        .headers
        .iter()
        .any(|(k, v)| k == ASSERTION_HEADER && v == "Status must be valid"));

    // well-formed body: nothing fires
    let live = LiveRequest {
        payload: Some(json!({"status": "open"})),
        ..LiveRequest::new()
    };
    let out = run(&spec, &live);
    assert_eq!(out.code, 201);
    assert_eq!(out.flow, None);
}

#[test]
fn cast_applies_uniformly_after_repeat_expansion() {
    let spec = spec(json!({
        "request": {"route": "/rows", "method": "GET"},
        "response": {
            "code": 200,
            "data": [{"n": "1", "ok": "true"}],
            "$data": {
                "repeat": "4",
                "cast": {"*.n": "number", "*.ok": "boolean"}
            }
        }
    }));
    let out = run(&spec, &LiveRequest::new());
    let rows = out.content.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    for row in rows {
        assert_eq!(row["n"], json!(1));
        assert_eq!(row["ok"], json!(true));
    }
}

#[test]
fn cast_failure_is_a_conspicuous_string_not_an_error() {
    let spec = spec(json!({
        "request": {"route": "/t", "method": "GET"},
        "response": {
            "code": 200,
            "data": {"count": "{payload.count}"},
            "$data": {"cast": {"count": "number"}}
        }
    }));
    // nothing resolves the placeholder, so the cast sees a non-numeric string
    let out = run(&spec, &LiveRequest::new());
    let text = out.content["count"].as_str().unwrap();
    assert!(text.starts_with("[cast error:"), "got {text}");
    assert_eq!(out.code, 200);
}

#[test]
fn unresolved_placeholders_stay_visible_in_output() {
    let spec = spec(json!({
        "request": {"route": "/t", "method": "GET"},
        "response": {"code": 200, "data": "hello {payload.name}"}
    }));
    let out = run(&spec, &LiveRequest::new());
    assert_eq!(out.content, json!("hello {payload.name}"));
}

#[test]
fn override_response_templates_are_generated_too() {
    let spec = spec(json!({
        "request": {"route": "/t", "method": "POST"},
        "response": {"code": 200, "data": "ok"},
        "except": {
            "Echo rejection": {
                "validate": ["false"],
                "response": {
                    "code": 400,
                    "data": {"rejected": "{payload.reason}"},
                    "$data": {"cast": {"rejected": "string"}}
                }
            }
        }
    }));
    let live = LiveRequest {
        payload: Some(json!({"reason": "nope"})),
        ..LiveRequest::new()
    };
    let out = run(&spec, &live);
    assert_eq!(out.code, 400);
    assert_eq!(out.content, json!({"rejected": "nope"}));
}

#[test]
fn repeat_range_with_wildcard_cast_end_to_end() {
    let spec = spec(json!({
        "request": {"route": "/nums", "method": "GET"},
        "response": {
            "code": 200,
            "data": ["10", "20", "30", "40", "50"],
            "$data": {"repeat": "10..20", "cast": {"*": "number"}}
        }
    }));
    for _ in 0..10 {
        let out = run(&spec, &LiveRequest::new());
        let items = out.content.as_array().unwrap();
        // 10..=20 whole copies of a 5-element list
        assert!(items.len() % 5 == 0);
        let copies = items.len() / 5;
        assert!((10..=20).contains(&copies), "copies {copies}");
        assert!(items.iter().all(Value::is_number));
    }
}

//! Route handlers: the mock dispatcher plus the admin endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use mimus_eval::LiveRequest;

use super::json_error;
use super::state::AppState;
use crate::filler;
use crate::loader::LoadedSpec;

/// Fallback for paths no spec covers.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "no spec matches this route")
}

/// GET /__mimus/health
pub(crate) async fn handle_health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// GET /__mimus/specs
pub(crate) async fn handle_list_specs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let specs: Vec<serde_json::Value> = state
        .specs
        .iter()
        .map(|loaded| {
            serde_json::json!({
                "name": loaded.name,
                "route": loaded.spec.request.route,
                "method": loaded.spec.request.method.as_str(),
                "except_cases": loaded
                    .spec
                    .except
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<&str>>(),
            })
        })
        .collect();
    (StatusCode::OK, Json(serde_json::json!({ "specs": specs })))
}

/// Dispatcher for one mock route: picks the spec by method, assembles the
/// live request, and runs the engine.
pub(crate) async fn handle_mock(
    specs: Arc<Vec<Arc<LoadedSpec>>>,
    method: Method,
    uri: Uri,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(loaded) = specs
        .iter()
        .find(|s| s.spec.request.method.as_str() == method.as_str())
    else {
        let allowed: Vec<&str> = specs
            .iter()
            .map(|s| s.spec.request.method.as_str())
            .collect();
        return json_error(
            StatusCode::METHOD_NOT_ALLOWED,
            &format!("method {} not served here, allowed: {}", method, allowed.join(", ")),
        )
        .into_response();
    };

    let live = LiveRequest {
        params: params.into_iter().collect(),
        query: query.into_iter().collect(),
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
        payload: parse_body(&body),
    };

    let generated = match mimus_eval::generate(&loaded.spec, &live, &filler::fill) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {} {}: {}", method, uri.path(), e);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
                .into_response();
        }
    };

    if let (Some(flow), Some(reason)) = (generated.flow.as_deref(), generated.flow_reason.as_deref())
    {
        eprintln!(
            "warning: except case '{}' fired on a predicate evaluation error: {}",
            flow, reason
        );
    }

    match generated.flow.as_deref() {
        Some(flow) => eprintln!(
            "{} {} -> {} [{}] (except: {})",
            method,
            uri.path(),
            generated.code,
            loaded.name,
            flow
        ),
        None => eprintln!("{} {} -> {} [{}]", method, uri.path(), generated.code, loaded.name),
    }

    let status = StatusCode::from_u16(generated.code).unwrap_or(StatusCode::OK);
    let mut header_map = HeaderMap::new();
    for (name, value) in &generated.headers {
        let Ok(name) = HeaderName::try_from(name.as_str()) else {
            continue;
        };
        let Ok(value) = HeaderValue::try_from(value.as_str()) else {
            continue;
        };
        header_map.insert(name, value);
    }
    (status, header_map, Json(generated.content)).into_response()
}

/// A body is a payload only if it parses as JSON; anything else reads as
/// absent and the spec's default payload applies alone.
fn parse_body(body: &Bytes) -> Option<serde_json::Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

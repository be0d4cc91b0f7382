//! `mimus serve` -- the mock HTTP server.
//!
//! Registers one axum route per distinct route pattern across the loaded
//! specs (`:name` pattern segments become axum `{name}` captures) and
//! dispatches by method inside the handler. Admin endpoints live under the
//! reserved `/__mimus` prefix:
//!
//! - GET /__mimus/health  - server status
//! - GET /__mimus/specs   - loaded spec listing
//!
//! All responses use Content-Type: application/json.

mod handlers;
mod state;

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query};
use axum::http::header::HeaderMap;
use axum::http::{Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use self::handlers::{handle_health, handle_list_specs, handle_mock, handle_not_found};
use self::state::AppState;
use crate::loader::LoadedSpec;

/// Maximum request body size: 10 MB.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Translate a `:name` route pattern to axum's `{name}` capture syntax.
fn axum_route(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{name}}}"),
            None => segment.to_string(),
        })
        .collect::<Vec<String>>()
        .join("/")
}

/// Start the mock server on the given port with the given specs.
pub async fn start_server(
    port: u16,
    specs: Vec<LoadedSpec>,
) -> Result<(), Box<dyn std::error::Error>> {
    let specs: Vec<Arc<LoadedSpec>> = specs.into_iter().map(Arc::new).collect();

    // Group specs by route pattern; each pattern registers once and the
    // handler dispatches by method.
    let mut by_route: BTreeMap<String, Vec<Arc<LoadedSpec>>> = BTreeMap::new();
    for loaded in &specs {
        let group = by_route.entry(loaded.spec.request.route.clone()).or_default();
        if let Some(existing) = group
            .iter()
            .find(|s| s.spec.request.method == loaded.spec.request.method)
        {
            eprintln!(
                "warning: {} {} already served by '{}', ignoring '{}'",
                loaded.spec.request.method.as_str(),
                loaded.spec.request.route,
                existing.name,
                loaded.name
            );
            continue;
        }
        group.push(Arc::clone(loaded));
    }

    let mut router: Router<Arc<AppState>> = Router::new()
        .route("/__mimus/health", get(handle_health))
        .route("/__mimus/specs", get(handle_list_specs));

    for (pattern, group) in by_route {
        let path = axum_route(&pattern);
        let group = Arc::new(group);
        router = router.route(
            &path,
            any(
                move |method: Method,
                      uri: Uri,
                      params: Path<HashMap<String, String>>,
                      query: Query<HashMap<String, String>>,
                      headers: HeaderMap,
                      body: Bytes| {
                    handle_mock(Arc::clone(&group), method, uri, params, query, headers, body)
                },
            ),
        );
    }

    // CORS: permissive, this is a development tool
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = Arc::new(AppState { specs });
    let app = router
        .fallback(handle_not_found)
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("Mimus mock server listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    eprintln!("\nServer shut down.");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        eprintln!("warning: failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    eprintln!("\nReceived shutdown signal...");
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

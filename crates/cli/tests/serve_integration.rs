//! Integration tests for the `mimus serve` HTTP API.
//!
//! Each test starts the server as a child process on a unique port,
//! makes HTTP requests, and verifies the responses.

use std::io::Read;
use std::net::TcpStream;
use std::path::Path;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use tempfile::TempDir;

/// Atomic port counter to avoid port conflicts between parallel tests.
/// Base port is derived from process ID so parallel `cargo test --workspace`
/// runs (which spawn separate test binaries) don't collide on the same range.
static NEXT_PORT: AtomicU16 = AtomicU16::new(0);
static PORT_INIT: std::sync::Once = std::sync::Once::new();

fn next_port() -> u16 {
    PORT_INIT.call_once(|| {
        let base = 21000 + (std::process::id() as u16 % 20000);
        NEXT_PORT.store(base, Ordering::SeqCst);
    });
    NEXT_PORT.fetch_add(1, Ordering::SeqCst)
}

/// Helper: write each (name, body) spec into a fresh temp dir.
fn spec_dir(specs: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    for (name, body) in specs {
        std::fs::write(dir.path().join(name), body).expect("write spec");
    }
    dir
}

/// Helper: start the mimus serve process on the given port.
fn start_server(port: u16, specs: &Path) -> Child {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mimus"));
    cmd.arg("serve").arg("--port").arg(port.to_string());
    cmd.arg(specs);
    // Redirect stdout/stderr to avoid blocking
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    let child = cmd.spawn().expect("failed to start mimus serve");
    // Wait for server to be ready by polling the port
    for _ in 0..50 {
        if TcpStream::connect(format!("127.0.0.1:{}", port)).is_ok() {
            return child;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    child
}

/// Helper: send a raw HTTP request and return (status, headers, body).
fn http_request(port: u16, raw: &str) -> (u16, String, String) {
    let mut stream = TcpStream::connect(format!("127.0.0.1:{}", port)).expect("failed to connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    std::io::Write::write_all(&mut stream, raw.as_bytes()).expect("failed to write");

    let mut response = String::new();
    let _ = stream.read_to_string(&mut response);
    parse_http_response(&response)
}

/// Helper: make a simple HTTP GET request and return (status, body).
fn http_get(port: u16, path: &str) -> (u16, String) {
    let (status, _, body) = http_get_full(port, path, &[]);
    (status, body)
}

/// Helper: HTTP GET with custom headers, returning (status, headers, body).
fn http_get_full(port: u16, path: &str, extra: &[(&str, &str)]) -> (u16, String, String) {
    let mut header_lines = String::new();
    for (name, value) in extra {
        header_lines.push_str(&format!("{}: {}\r\n", name, value));
    }
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: localhost:{}\r\n{}Connection: close\r\n\r\n",
        path, port, header_lines
    );
    http_request(port, &request)
}

/// Helper: make a simple HTTP POST request and return (status, body).
fn http_post(port: u16, path: &str, body: &str) -> (u16, String) {
    let request = format!(
        "POST {} HTTP/1.1\r\nHost: localhost:{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        path, port, body.len(), body
    );
    let (status, _, body) = http_request(port, &request);
    (status, body)
}

/// Extract a header value from raw headers string.
fn extract_header<'a>(headers: &'a str, name: &str) -> Option<&'a str> {
    let name_lower = name.to_lowercase();
    for line in headers.lines() {
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().to_lowercase() == name_lower {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Parse an HTTP response into (status_code, headers_string, body).
fn parse_http_response(response: &str) -> (u16, String, String) {
    let parts: Vec<&str> = response.splitn(2, "\r\n\r\n").collect();
    let headers = parts.first().unwrap_or(&"").to_string();
    let body = parts.get(1).unwrap_or(&"").to_string();

    let status_line = headers.lines().next().unwrap_or("");
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(0);

    // Handle chunked transfer encoding
    let body = if headers.to_lowercase().contains("transfer-encoding: chunked") {
        decode_chunked(&body)
    } else {
        body
    };

    (status, headers, body)
}

/// Decode chunked transfer encoding.
fn decode_chunked(data: &str) -> String {
    let mut result = String::new();
    let mut remaining = data;

    while let Some(line_end) = remaining.find("\r\n") {
        let size_str = &remaining[..line_end];
        let size = match usize::from_str_radix(size_str.trim(), 16) {
            Ok(s) => s,
            Err(_) => break,
        };
        if size == 0 {
            break;
        }
        let chunk_start = line_end + 2;
        let chunk_end = chunk_start + size;
        if chunk_end > remaining.len() {
            result.push_str(&remaining[chunk_start..]);
            break;
        }
        result.push_str(&remaining[chunk_start..chunk_end]);
        remaining = if chunk_end + 2 <= remaining.len() {
            &remaining[chunk_end + 2..]
        } else {
            ""
        };
    }

    result
}

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

const USER_SPEC: &str = r#"{
    "request": {"route": "/users/:id", "method": "GET"},
    "response": {
        "code": 200,
        "headers": {"x-served-by": "mimus"},
        "data": {"id": "{route.id}", "name": "anonymous"}
    },
    "except": {
        "missing": {
            "validate": ["query.missing != \"yes\""],
            "response": {"code": 404, "data": {"error": "no such user"}}
        }
    }
}"#;

const ECHO_SPEC: &str = r#"{
    "request": {
        "route": "/echo",
        "method": "POST",
        "payload": {"message": "default"}
    },
    "response": {
        "code": 201,
        "data": {"echoed": "{payload.message}"}
    }
}"#;

// ──────────────────────────────────────────────
// Admin endpoints
// ──────────────────────────────────────────────

#[test]
fn health_returns_200_with_version() {
    let dir = spec_dir(&[("users.json", USER_SPEC)]);
    let port = next_port();
    let mut child = start_server(port, dir.path());

    let (status, body) = http_get(port, "/__mimus/health");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["status"], "ok");
    assert!(json.get("version").is_some(), "version field must be present");
}

#[test]
fn specs_endpoint_lists_loaded_specs() {
    let dir = spec_dir(&[("users.json", USER_SPEC), ("echo.json", ECHO_SPEC)]);
    let port = next_port();
    let mut child = start_server(port, dir.path());

    let (status, body) = http_get(port, "/__mimus/specs");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    let specs = json["specs"].as_array().expect("specs array");
    assert_eq!(specs.len(), 2);
    let routes: Vec<&str> = specs
        .iter()
        .map(|s| s["route"].as_str().unwrap())
        .collect();
    assert!(routes.contains(&"/users/:id"));
    assert!(routes.contains(&"/echo"));
}

// ──────────────────────────────────────────────
// Mock routes
// ──────────────────────────────────────────────

#[test]
fn mock_route_interpolates_route_params() {
    let dir = spec_dir(&[("users.json", USER_SPEC)]);
    let port = next_port();
    let mut child = start_server(port, dir.path());

    let (status, headers, body) = http_get_full(port, "/users/42", &[]);
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    assert_eq!(extract_header(&headers, "x-served-by"), Some("mimus"));
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["id"], "42");
    assert_eq!(json["name"], "anonymous");
}

#[test]
fn firing_except_case_overrides_and_asserts() {
    let dir = spec_dir(&[("users.json", USER_SPEC)]);
    let port = next_port();
    let mut child = start_server(port, dir.path());

    let (status, headers, body) = http_get_full(port, "/users/42?missing=yes", &[]);
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 404);
    assert_eq!(extract_header(&headers, "x-mimus-assertion"), Some("missing"));
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["error"], "no such user");
}

#[test]
fn post_body_overrides_default_payload() {
    let dir = spec_dir(&[("echo.json", ECHO_SPEC)]);
    let port = next_port();
    let mut child = start_server(port, dir.path());

    let (status, body) = http_post(port, "/echo", r#"{"message": "hello"}"#);
    let (default_status, default_body) = http_post(port, "/echo", "");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 201);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["echoed"], "hello");

    // Empty body falls back to the declared default payload
    assert_eq!(default_status, 201);
    let json: serde_json::Value = serde_json::from_str(&default_body).expect("valid JSON");
    assert_eq!(json["echoed"], "default");
}

#[test]
fn wrong_method_returns_405() {
    let dir = spec_dir(&[("echo.json", ECHO_SPEC)]);
    let port = next_port();
    let mut child = start_server(port, dir.path());

    let (status, body) = http_get(port, "/echo");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 405);
    assert!(body.contains("POST"), "allowed methods listed: {body}");
}

#[test]
fn unknown_route_returns_404() {
    let dir = spec_dir(&[("echo.json", ECHO_SPEC)]);
    let port = next_port();
    let mut child = start_server(port, dir.path());

    let (status, body) = http_get(port, "/nowhere");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 404);
    assert!(body.contains("no spec matches"));
}

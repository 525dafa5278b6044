//! Test helpers and utilities for FluentRouter tests
//!
//! - **Dispatch tests** call [`Dispatcher::resolve`] directly with a
//!   [`BufferedResponse`] sink; no runtime needed.
//! - **Host tests** (`serve`) drive the Axum router with `oneshot()` for
//!   fast, in-process testing without network I/O.
//!
//! ## Available Helpers
//!
//! - Configuration builders: `create_base_config()`, `create_config_with_toml()`
//! - Router builders: `create_router()`
//! - Dispatch helpers: `dispatch()`, `text()`, `recorder()`
//! - Request/response helpers for the host: `get_request()`, `get_body_string()`

use crate::{
    BufferedResponse, Config, Dispatcher, FluentRouter, Flow, Outcome, Params, Reply, Request,
    ResponseSink,
};
use axum::{body::Body, response::Response};
use http::StatusCode;
use std::sync::{Arc, Mutex};

pub(crate) mod basic;
pub(crate) mod serve;

// ============================================================================
// Configuration Helpers
// ============================================================================

const BASE_CONFIG_TOML: &str = r#"
[http]
bind_addr = "127.0.0.1"
bind_port = 3000
max_payload_size_bytes = "1KiB"

[logging]
format = "json"
"#;

pub(crate) fn create_base_config() -> Config {
    BASE_CONFIG_TOML
        .parse()
        .expect("Failed to parse test config TOML")
}

/// Creates a test configuration with additional TOML sections appended.
pub(crate) fn create_config_with_toml(additional_toml: &str) -> Config {
    format!("{BASE_CONFIG_TOML}\n{additional_toml}")
        .parse()
        .expect("Failed to parse test config TOML")
}

// ============================================================================
// Router Helpers
// ============================================================================

pub(crate) fn create_router() -> FluentRouter {
    FluentRouter::new(create_base_config()).expect("Failed to create FluentRouter")
}

/// A handler that answers 200 with a fixed body.
pub(crate) fn text(
    body: &'static str,
) -> impl Fn(&Request, &mut dyn ResponseSink) + Send + Sync + 'static {
    move |_: &Request, res: &mut dyn ResponseSink| {
        res.send(Reply::text(StatusCode::OK, body));
    }
}

// ============================================================================
// Dispatch Helpers
// ============================================================================

pub(crate) fn dispatch(dispatcher: &Dispatcher, method: &str, target: &str) -> (Outcome, BufferedResponse) {
    let mut response = BufferedResponse::new();
    let outcome = dispatcher.resolve_path(method, target, &mut response);
    (outcome, response)
}

/// Shared log of which middleware ran, in order.
pub(crate) type Trail = Arc<Mutex<Vec<String>>>;

/// A middleware that appends `label` to `trail` and continues.
pub(crate) fn recorder(
    trail: &Trail,
    label: &'static str,
) -> impl Fn(&Request, Params) -> Flow + Send + Sync + 'static {
    let trail = Arc::clone(trail);
    move |_: &Request, params: Params| {
        trail.lock().unwrap().push(label.to_string());
        Flow::Continue(params)
    }
}

/// Like [`recorder`], but halts with `status` after recording.
pub(crate) fn halter(
    trail: &Trail,
    label: &'static str,
    status: StatusCode,
) -> impl Fn(&Request, Params) -> Flow + Send + Sync + 'static {
    let trail = Arc::clone(trail);
    move |_: &Request, _: Params| {
        trail.lock().unwrap().push(label.to_string());
        Flow::Halt(Reply::text(status, label))
    }
}

pub(crate) fn entries(trail: &Trail) -> Vec<String> {
    trail.lock().unwrap().clone()
}

// ============================================================================
// Host Helpers
// ============================================================================

pub(crate) fn get_request(uri: &str) -> http::Request<Body> {
    http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub(crate) async fn get_body_string(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).to_string()
}

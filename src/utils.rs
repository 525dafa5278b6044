//!
//! Utility functions shared by configuration, registration and serving.
//!
//! This module provides:
//! - [`normalize_path`] - Canonical form for route templates and request paths
//! - [`RequestIdGenerator`] - Generates or preserves request IDs for tracing
//! - [`replace_handlebars_with_env`] - Template substitution for environment variables
//!

use {
    http::{HeaderValue, Request},
    regex::{Captures, Regex},
    std::{env, sync::LazyLock},
    tower_http::request_id::{MakeRequestId, RequestId},
    uuid::{ContextV7, Timestamp, Uuid},
};

/// Matches `{{ VAR_NAME }}` with optional whitespace around an upper-case variable name.
static HANDLEBAR_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z0-9_]+)\s*\}\}").unwrap());

/// Normalizes a path or route template.
///
/// All leading and trailing slashes are collapsed, a single leading `/` is
/// added, and the empty path becomes the root `/`. Inner slashes are left
/// alone, so `//` inside a path survives and later fails to match.
///
/// ```
/// use kiwi_dispatch::normalize_path;
///
/// assert_eq!(normalize_path("users/42/"), "/users/42");
/// assert_eq!(normalize_path("///"), "/");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    let mut clean = String::with_capacity(trimmed.len() + 1);
    clean.push('/');
    clean.push_str(trimmed);
    clean
}

/// Joins a group or controller prefix with a route path and normalizes the result.
///
/// The prefix loses its trailing slashes and the path its leading ones, so
/// `join_route("/admin/", "/x")` and `join_route("/admin", "x")` agree.
pub fn join_route(prefix: &str, path: &str) -> String {
    let joined = format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    normalize_path(&joined)
}

/// Request ID generator for request correlation in logs.
///
/// Preserves an incoming `x-request-id` header, otherwise generates a UUIDv7.
///
/// ```
/// use kiwi_dispatch::RequestIdGenerator;
/// use tower_http::request_id::SetRequestIdLayer;
///
/// let layer = SetRequestIdLayer::x_request_id(RequestIdGenerator);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, req: &Request<B>) -> Option<RequestId> {
        match req.headers().get("x-request-id") {
            Some(value) => Some(RequestId::new(value.clone())),
            None => {
                let cx = ContextV7::new().with_additional_precision();
                let uuid = Uuid::new_v7(Timestamp::now(cx));
                let value = HeaderValue::from_str(&uuid.to_string()).ok()?;
                Some(RequestId::new(value))
            }
        }
    }
}

/// Replaces handlebars-style placeholders with environment variable values.
///
/// Patterns like `{{ VAR_NAME }}` are replaced by the variable's value; an
/// unset variable becomes the empty string and a warning is logged.
///
/// ```
/// use kiwi_dispatch::replace_handlebars_with_env;
///
/// let template = "Value: {{ KIWI_SURELY_MISSING_VAR }}";
/// assert_eq!(replace_handlebars_with_env(template), "Value: ");
/// ```
pub fn replace_handlebars_with_env(input: &str) -> String {
    HANDLEBAR_REGEXP
        .replace_all(input, |caps: &Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!(
                    variable = %var_name,
                    "Environment variable not found, substituting with empty string"
                );
                String::new()
            })
        })
        .to_string()
}

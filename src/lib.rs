//! # kiwi-dispatch
//!
//! A small HTTP dispatch layer. Routes are registered against `:name`
//! patterns, grouped under shared prefixes and middleware, and resolved to
//! exactly one handler per request. Controllers declare their constructor
//! parameters and get their dependencies wired from interface bindings.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use http::StatusCode;
//! use kiwi_dispatch::{Config, FluentRouter, Reply, ResponseSink, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default();  // Loads from config/{RUST_ENV}.toml
//!     config.setup_tracing();
//!
//!     let mut router = FluentRouter::new(config)?;
//!     router.get("/users/:id", |request, res| {
//!         let id = request.param("id").unwrap_or_default();
//!         res.send(Reply::text(StatusCode::OK, format!("user {id}")));
//!     }, ())?;
//!
//!     router.seal()?.start().await
//! }
//! ```
//!
//! With `config/dev.toml`:
//! ```toml
//! [http]
//! bind_port = 3000
//! max_payload_size_bytes = "1MiB"
//!
//! [router]
//! routes_endpoint = "/debug/routes"
//! ```
//!
//! Run with `RUST_ENV=dev cargo run`.
//!
//! # Dispatch Rules
//!
//! | Rule | Behavior |
//! |------|----------|
//! | Specificity | Routes with fewer `:param` segments are tried first; ties keep registration order |
//! | Methods | A path match with another method is skipped; the scan continues |
//! | Middleware | Global, then group (outer to inner), then route middleware |
//! | Short-circuit | A middleware returning `Flow::Halt` sends its reply; nothing after it runs |
//! | Not found | `404 text/plain` with `router.not_found_message` |
//!
//! # Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | Configuration loading and validation ([`Config`]) |
//! | `fluent` | Registration, dispatch and serving ([`FluentRouter`], [`Dispatcher`]) |
//! | `error` | Error types and handling ([`Error`]) |
//! | `utils` | Path normalization, request ids, env substitution |
//!
//! # Error Handling
//!
//! Setup mistakes (unknown middleware, unbound interfaces, malformed
//! patterns) surface as [`Error`] values from the registration call that
//! made them. Dispatch itself never fails: an unmatched request becomes a
//! not-found response.

mod config;
mod error;
mod fluent;
mod utils;

pub use config::*;
pub use error::*;
pub use fluent::*;
pub use utils::*;

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

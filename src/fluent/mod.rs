//! FluentRouter, the dispatcher it seals into, and everything handlers touch.
//!
//! The functionality is split across submodules:
//!
//! - [`pattern`] - Route template compilation and matching
//! - [`params`] - Ordered route parameter bag
//! - [`middleware`] - Middleware references, `Flow`, and the registry
//! - [`routes`] - Methods, handlers, group options and route table entries
//! - [`router`] - Core `FluentRouter`: registration and group scoping
//! - [`activator`] - Declarative constructor wiring and interface bindings
//! - [`controller`] - Self-registering controllers
//! - [`dispatch`] - The sealed `Dispatcher`
//! - [`request`] / [`response`] - The handler-facing request view and response sink
//! - [`serve`] - Axum host adapter, graceful shutdown

mod activator;
mod controller;
mod dispatch;
mod middleware;
mod params;
mod pattern;
mod request;
mod response;
mod router;
mod routes;
mod serve;
mod shutdown;

pub use activator::{Arguments, Bindings, Component, Dependency, ParamKind, Parameter};
pub use controller::{Action, Controller, ControllerRoutes};
pub use dispatch::{Dispatcher, Outcome};
pub use middleware::{Flow, Middleware, MiddlewareFn, MiddlewareRegistry};
pub use params::Params;
pub use pattern::RoutePattern;
pub use request::Request;
pub use response::{BufferedResponse, Reply, ResponseSink};
pub use router::FluentRouter;
pub use routes::{GroupOptions, Handler, HttpMethod, Route, RouteInfo};
pub use shutdown::{ShutdownNotifier, ShutdownPhase};

#[cfg(test)]
mod tests;

//! Controllers: route groups that are constructed with their dependencies.
//!
//! ```rust
//! use std::sync::Arc;
//! use http::StatusCode;
//! use kiwi_dispatch::{
//!     Arguments, BufferedResponse, Component, Config, Controller, ControllerRoutes,
//!     FluentRouter, Parameter, Reply, Request, ResponseSink, Result,
//! };
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self, name: &str) -> String;
//! }
//!
//! struct Polite;
//! impl Greeter for Polite {
//!     fn greet(&self, name: &str) -> String {
//!         format!("Good day, {name}")
//!     }
//! }
//! impl Component for Polite {
//!     fn create() -> Self { Polite }
//! }
//!
//! struct HelloController {
//!     greeter: Arc<dyn Greeter>,
//! }
//!
//! impl HelloController {
//!     fn hello(&self, request: &Request, res: &mut dyn ResponseSink) {
//!         let name = request.param("name").unwrap_or("stranger");
//!         res.send(Reply::text(StatusCode::OK, self.greeter.greet(name)));
//!     }
//! }
//!
//! impl Controller for HelloController {
//!     const NAME: &'static str = "HelloController";
//!
//!     fn parameters() -> Vec<Parameter> {
//!         vec![Parameter::string("prefix"), Parameter::interface::<dyn Greeter>("greeter")]
//!     }
//!
//!     fn construct(args: &Arguments) -> Result<Self> {
//!         Ok(Self { greeter: args.dependency("greeter")? })
//!     }
//!
//!     fn register_routes(&self, routes: &mut ControllerRoutes<'_, Self>) -> Result<()> {
//!         routes.get("/:name", "hello", Self::hello, ())?;
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let mut router = FluentRouter::new("".parse::<Config>()?)?;
//! router.bind::<dyn Greeter, Polite>(|c| c);
//! router.add_controller::<HelloController>("/hello", ())?;
//!
//! let dispatcher = router.seal()?;
//! let mut response = BufferedResponse::new();
//! dispatcher.resolve_path("GET", "/hello/ada", &mut response);
//! assert_eq!(response.body_text(), "Good day, ada");
//! assert_eq!(dispatcher.routes()[0].callback, "HelloController::hello");
//! # Ok(())
//! # }
//! ```

use {
    super::{
        middleware::Middleware,
        request::Request,
        response::ResponseSink,
        router::FluentRouter,
        routes::{Handler, HttpMethod, Route},
        activator::{Arguments, Parameter},
    },
    crate::{Result, utils::join_route},
    std::sync::Arc,
};

/// An action method of controller `C`.
pub type Action<C> = fn(&C, &Request, &mut dyn ResponseSink);

/// A type that registers its own routes after being constructed by the activator.
pub trait Controller: Send + Sync + Sized + 'static {
    /// Shown in route listings as `NAME::method`.
    const NAME: &'static str;

    /// The constructor descriptor, in declaration order.
    fn parameters() -> Vec<Parameter>;

    /// Builds the controller from the resolved arguments.
    fn construct(args: &Arguments) -> Result<Self>;

    /// Registers the controller's routes.
    fn register_routes(&self, routes: &mut ControllerRoutes<'_, Self>) -> Result<()>;
}

/// Route registration on behalf of one controller instance.
///
/// Paths are relative to the controller prefix, and the inherited middleware
/// list runs ahead of each route's own middleware. Nothing reaches the
/// router until the controller's registration has succeeded.
pub struct ControllerRoutes<'a, C> {
    router: &'a FluentRouter,
    controller: Arc<C>,
    prefix: String,
    inherited: Middleware,
    staged: Vec<Route>,
}

impl<C: Controller> ControllerRoutes<'_, C> {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Registers `action` for `method` at `path`, listed as `C::NAME::name`.
    pub fn route(
        &mut self,
        method: HttpMethod,
        path: &str,
        name: &str,
        action: Action<C>,
        middleware: impl Into<Middleware>,
    ) -> Result<&mut Self> {
        let controller = Arc::clone(&self.controller);
        let handler = Handler::named(format!("{}::{}", C::NAME, name), move |request, res| {
            action(&controller, request, res)
        });
        let middleware = if self.inherited.is_empty() {
            middleware.into()
        } else {
            Middleware::List(vec![self.inherited.clone(), middleware.into()])
        };
        let path = join_route(&self.prefix, path);

        let route = self.router.build_route(method, &path, handler, &middleware)?;
        self.staged.push(route);
        Ok(self)
    }

    pub fn get(
        &mut self,
        path: &str,
        name: &str,
        action: Action<C>,
        middleware: impl Into<Middleware>,
    ) -> Result<&mut Self> {
        self.route(HttpMethod::Get, path, name, action, middleware)
    }

    pub fn post(
        &mut self,
        path: &str,
        name: &str,
        action: Action<C>,
        middleware: impl Into<Middleware>,
    ) -> Result<&mut Self> {
        self.route(HttpMethod::Post, path, name, action, middleware)
    }

    pub fn put(
        &mut self,
        path: &str,
        name: &str,
        action: Action<C>,
        middleware: impl Into<Middleware>,
    ) -> Result<&mut Self> {
        self.route(HttpMethod::Put, path, name, action, middleware)
    }

    pub fn delete(
        &mut self,
        path: &str,
        name: &str,
        action: Action<C>,
        middleware: impl Into<Middleware>,
    ) -> Result<&mut Self> {
        self.route(HttpMethod::Delete, path, name, action, middleware)
    }
}

impl FluentRouter {
    /// Constructs controller `C` and lets it register its routes.
    ///
    /// `prefix` and `middleware` reach the controller only if it declares
    /// `prefix` (string) and `middleware` (list) parameters; a controller
    /// that does not declare a prefix registers its paths unprefixed.
    ///
    /// # Errors
    ///
    /// `UnresolvedDependency` for an interface without binding,
    /// `UnresolvableParameter` for a parameter the activator cannot supply,
    /// and any error from the controller's constructor or registration.
    /// On error no route of the controller is registered.
    pub fn add_controller<C: Controller>(
        &mut self,
        prefix: &str,
        middleware: impl Into<Middleware>,
    ) -> Result<&mut Self> {
        let middleware = middleware.into();
        let args = self
            .bindings
            .resolve(C::NAME, &C::parameters(), prefix, &middleware)?;
        let controller = Arc::new(C::construct(&args)?);

        let staged = {
            let mut routes = ControllerRoutes {
                router: &*self,
                controller: Arc::clone(&controller),
                prefix: args.prefix().unwrap_or_default().to_string(),
                inherited: args.middleware().cloned().unwrap_or_default(),
                staged: Vec::new(),
            };
            controller.register_routes(&mut routes)?;
            routes.staged
        };

        tracing::info!(
            controller = C::NAME,
            prefix,
            routes = staged.len(),
            "Activated controller"
        );
        for route in staged {
            self.push_route(route);
        }
        Ok(self)
    }
}

//! Core FluentRouter struct: registration of middleware, bindings, groups and routes.

use {
    super::{
        activator::{Bindings, Component},
        dispatch::Dispatcher,
        middleware::{Flow, Middleware, MiddlewareFn, MiddlewareRegistry},
        params::Params,
        pattern::RoutePattern,
        request::Request,
        response::{Reply, ResponseSink},
        routes::{GroupOptions, Handler, HttpMethod, Route, RouteInfo},
        shutdown::ShutdownNotifier,
    },
    crate::{Config, Result, utils::normalize_path},
    http::StatusCode,
    std::{
        ops::{Deref, DerefMut},
        sync::{Arc, OnceLock},
    },
    tokio_util::sync::CancellationToken,
};

/// Registration-phase router.
///
/// All setup happens through `&mut self`: middleware, interface bindings,
/// groups, routes and controllers. [`FluentRouter::seal`] then consumes the
/// router and returns an immutable [`Dispatcher`] that serves requests.
///
/// ```rust
/// use kiwi_dispatch::{BufferedResponse, Config, FluentRouter, Flow, GroupOptions, Reply, ResponseSink};
/// use http::StatusCode;
///
/// # fn main() -> kiwi_dispatch::Result<()> {
/// let mut router = FluentRouter::new("".parse::<Config>()?)?;
/// router.add_named_middleware("auth", |request, params| match request.header("authorization") {
///     Some(_) => Flow::Continue(params),
///     None => Flow::Halt(Reply::text(StatusCode::UNAUTHORIZED, "Unauthorized")),
/// });
/// router.group(GroupOptions::new("/admin").with_middleware("auth"), |admin| {
///     admin.get("/stats", |_, res| {
///         res.send(Reply::text(StatusCode::OK, "ok"));
///     }, ())?;
///     Ok(())
/// })?;
///
/// let dispatcher = router.seal()?;
/// let mut response = BufferedResponse::new();
/// dispatcher.resolve_path("GET", "/admin/stats", &mut response);
/// assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
/// # Ok(())
/// # }
/// ```
pub struct FluentRouter {
    pub(crate) config: Config,
    pub(crate) registry: MiddlewareRegistry,
    pub(crate) bindings: Bindings,
    pub(crate) routes: Vec<Route>,
    pub(crate) groups: Vec<GroupOptions>,
    pub(crate) shutdown_notifier: ShutdownNotifier,
}

impl FluentRouter {
    /// Creates an empty router after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: MiddlewareRegistry::new(),
            bindings: Bindings::new(),
            routes: Vec::new(),
            groups: Vec::new(),
            shutdown_notifier: ShutdownNotifier::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the notifier that a started dispatcher reports shutdown phases to.
    #[must_use]
    pub fn shutdown_notifier(&self) -> &ShutdownNotifier {
        &self.shutdown_notifier
    }

    /// Returns a token that is cancelled when shutdown begins. Cancelling
    /// it yourself stops a started dispatcher.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown_notifier.cancellation_token()
    }

    /// Appends middleware that runs first on every dispatched route, in registration order.
    pub fn add_global_middleware<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Request, Params) -> Flow + Send + Sync + 'static,
    {
        self.registry.add_global(Arc::new(f));
        self
    }

    /// Registers middleware under `name`. A later registration of the same
    /// name replaces the earlier one for routes registered afterwards.
    pub fn add_named_middleware<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Request, Params) -> Flow + Send + Sync + 'static,
    {
        self.registry.add_named(name, Arc::new(f));
        self
    }

    /// Binds interface `I` to component `C` for controller activation.
    /// See [`Bindings::bind`].
    pub fn bind<I, C>(&mut self, coerce: fn(Arc<C>) -> Arc<I>) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
        C: Component,
    {
        self.bindings.bind(coerce);
        self
    }

    /// Runs `body` with `options` pushed on the group stack.
    ///
    /// Routes registered inside `body` get the concatenated prefixes and the
    /// middleware of every enclosing group, outermost first. The group is
    /// popped when `body` returns, fails or panics.
    pub fn group<F>(&mut self, options: impl Into<GroupOptions>, body: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut FluentRouter) -> Result<()>,
    {
        {
            let mut scope = GroupScope::enter(self, options.into());
            body(&mut scope)?;
        }
        Ok(self)
    }

    /// Registers a route for `method` under the active group prefixes.
    ///
    /// Route and group middleware are resolved against the registry now, so
    /// named middleware must already be registered.
    ///
    /// # Errors
    ///
    /// `InvalidPattern` for a malformed path, `UnknownMiddleware` for an
    /// unregistered middleware name.
    pub fn register_route(
        &mut self,
        method: HttpMethod,
        path: &str,
        handler: Handler,
        middleware: impl Into<Middleware>,
    ) -> Result<&mut Self> {
        let route = self.build_route(method, path, handler, &middleware.into())?;
        self.push_route(route);
        Ok(self)
    }

    pub fn get<F>(&mut self, path: &str, f: F, middleware: impl Into<Middleware>) -> Result<&mut Self>
    where
        F: Fn(&Request, &mut dyn ResponseSink) + Send + Sync + 'static,
    {
        self.register_route(HttpMethod::Get, path, Handler::new(f), middleware)
    }

    pub fn post<F>(&mut self, path: &str, f: F, middleware: impl Into<Middleware>) -> Result<&mut Self>
    where
        F: Fn(&Request, &mut dyn ResponseSink) + Send + Sync + 'static,
    {
        self.register_route(HttpMethod::Post, path, Handler::new(f), middleware)
    }

    pub fn put<F>(&mut self, path: &str, f: F, middleware: impl Into<Middleware>) -> Result<&mut Self>
    where
        F: Fn(&Request, &mut dyn ResponseSink) + Send + Sync + 'static,
    {
        self.register_route(HttpMethod::Put, path, Handler::new(f), middleware)
    }

    pub fn delete<F>(
        &mut self,
        path: &str,
        f: F,
        middleware: impl Into<Middleware>,
    ) -> Result<&mut Self>
    where
        F: Fn(&Request, &mut dyn ResponseSink) + Send + Sync + 'static,
    {
        self.register_route(HttpMethod::Delete, path, Handler::new(f), middleware)
    }

    /// Registers a route for a method given as a string, in any case.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a method other than GET, POST, PUT or DELETE.
    pub fn map<F>(
        &mut self,
        method: &str,
        path: &str,
        f: F,
        middleware: impl Into<Middleware>,
    ) -> Result<&mut Self>
    where
        F: Fn(&Request, &mut dyn ResponseSink) + Send + Sync + 'static,
    {
        let method: HttpMethod = method.to_ascii_uppercase().parse()?;
        self.register_route(method, path, Handler::new(f), middleware)
    }

    /// Lists the registered routes in registration order.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes.iter().map(Route::info).collect()
    }

    /// The full path a route registered now would get.
    pub(crate) fn qualify(&self, path: &str) -> String {
        let prefix: String = self
            .groups
            .iter()
            .map(|group| group.prefix.trim_end_matches('/'))
            .collect();
        normalize_path(&format!("{}/{}", prefix, path.trim_start_matches('/')))
    }

    pub(crate) fn build_route(
        &self,
        method: HttpMethod,
        path: &str,
        handler: Handler,
        middleware: &Middleware,
    ) -> Result<Route> {
        let pattern = RoutePattern::compile(&self.qualify(path))?;
        let route_middleware = self.registry.resolve(middleware)?;

        let mut group_middleware: Vec<MiddlewareFn> = Vec::new();
        for group in &self.groups {
            group_middleware.extend(self.registry.resolve(&group.middleware)?);
        }

        Ok(Route {
            method,
            pattern,
            handler,
            route_middleware,
            group_middleware,
        })
    }

    pub(crate) fn push_route(&mut self, route: Route) {
        tracing::debug!(
            method = %route.method,
            route = %route.pattern,
            callback = route.handler.display_name(),
            "Registered route"
        );
        self.routes.push(route);
    }

    /// Finishes registration and returns the dispatcher.
    ///
    /// Registers the route listing endpoint when `router.routes_endpoint` is
    /// configured, then orders the table by specificity: fewer parameter
    /// segments first, registration order among equals.
    ///
    /// # Errors
    ///
    /// `InvalidPattern` when the configured listing endpoint is not a valid route.
    pub fn seal(mut self) -> Result<Dispatcher> {
        let listing: Arc<OnceLock<Vec<RouteInfo>>> = Arc::new(OnceLock::new());

        if let Some(endpoint) = self.config.router.routes_endpoint.clone() {
            let table = Arc::clone(&listing);
            self.register_route(
                HttpMethod::Get,
                &endpoint,
                Handler::new(move |_, res| {
                    let routes = table.get().map(Vec::as_slice).unwrap_or_default();
                    res.send(Reply::json(StatusCode::OK, routes));
                }),
                (),
            )?;
        }

        self.routes.sort_by_key(|route| route.pattern.param_count());
        let _ = listing.set(self.routes.iter().map(Route::info).collect());

        tracing::info!(
            routes = self.routes.len(),
            global_middleware = self.registry.global().len(),
            "Router sealed"
        );

        Ok(Dispatcher::new(
            self.config,
            self.registry.global().to_vec(),
            self.routes,
            self.shutdown_notifier,
        ))
    }
}

impl std::fmt::Debug for FluentRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluentRouter")
            .field("routes", &self.routes)
            .field("registry", &self.registry)
            .field("bindings", &self.bindings)
            .field("groups", &self.groups.len())
            .finish()
    }
}

/// Keeps a group on the stack for as long as it lives.
struct GroupScope<'a> {
    router: &'a mut FluentRouter,
}

impl<'a> GroupScope<'a> {
    fn enter(router: &'a mut FluentRouter, options: GroupOptions) -> Self {
        tracing::trace!(prefix = %options.prefix, depth = router.groups.len() + 1, "Entering route group");
        router.groups.push(options);
        Self { router }
    }
}

impl Deref for GroupScope<'_> {
    type Target = FluentRouter;

    fn deref(&self) -> &FluentRouter {
        self.router
    }
}

impl DerefMut for GroupScope<'_> {
    fn deref_mut(&mut self) -> &mut FluentRouter {
        self.router
    }
}

impl Drop for GroupScope<'_> {
    fn drop(&mut self) {
        self.router.groups.pop();
    }
}

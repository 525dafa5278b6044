//! The sealed, read-only dispatcher.

use {
    super::{
        middleware::{Flow, MiddlewareFn},
        params::Params,
        request::Request,
        response::{Reply, ResponseSink},
        routes::{Route, RouteInfo},
        shutdown::ShutdownNotifier,
    },
    crate::{Config, Error, Result},
};

/// What happened to a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The route's handler ran.
    Handled { route: RouteInfo },
    /// A middleware stage halted before the handler.
    Halted { route: RouteInfo },
    /// No route matched; the not-found reply was sent.
    NotFound,
}

impl Outcome {
    pub fn route(&self) -> Option<&RouteInfo> {
        match self {
            Self::Handled { route } | Self::Halted { route } => Some(route),
            Self::NotFound => None,
        }
    }
}

/// Resolves requests against a sealed route table.
///
/// Created by [`FluentRouter::seal`](super::FluentRouter::seal). The table is
/// already in specificity order and nothing can be registered any more, so a
/// `Dispatcher` can be shared across threads behind an `Arc`.
pub struct Dispatcher {
    pub(crate) config: Config,
    global: Vec<MiddlewareFn>,
    routes: Vec<Route>,
    pub(crate) shutdown_notifier: ShutdownNotifier,
}

impl Dispatcher {
    pub(crate) fn new(
        config: Config,
        global: Vec<MiddlewareFn>,
        routes: Vec<Route>,
        shutdown_notifier: ShutdownNotifier,
    ) -> Self {
        Self {
            config,
            global,
            routes,
            shutdown_notifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The route table in matching order.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes.iter().map(Route::info).collect()
    }

    /// Dispatches `request`, writing exactly one response to `sink`.
    ///
    /// The first route in specificity order whose pattern matches the path
    /// and whose method equals the request method wins. A pattern match with
    /// another method is skipped, not answered with 405. The matched route's
    /// middleware runs global first, then group, then route middleware; any
    /// stage may replace the parameter bag or halt with a reply. When no
    /// route matches, a plain-text 404 with the configured message is sent.
    pub fn resolve(&self, mut request: Request, sink: &mut dyn ResponseSink) -> Outcome {
        let (route, mut params) = match self.find(request.method(), request.path()) {
            Ok(found) => found,
            Err(err) => {
                tracing::info!(method = request.method(), path = request.path(), "{}", err);
                sink.send(Reply::not_found(self.config.router.not_found_message.as_str()));
                return Outcome::NotFound;
            }
        };

        tracing::debug!(
            method = request.method(),
            path = request.path(),
            route = %route.pattern,
            callback = route.handler.display_name(),
            "Matched route"
        );

        let chain = self
            .global
            .iter()
            .chain(&route.group_middleware)
            .chain(&route.route_middleware);

        for (stage, middleware) in chain.enumerate() {
            request.set_params(params.clone());
            match middleware(&request, params) {
                Flow::Continue(next) => params = next,
                Flow::Halt(reply) => {
                    tracing::info!(
                        route = %route.pattern,
                        stage,
                        status = reply.status().as_u16(),
                        "Middleware halted request"
                    );
                    sink.send(reply);
                    return Outcome::Halted {
                        route: route.info(),
                    };
                }
            }
        }

        request.set_params(params);
        route.handler.call(&request, sink);
        if !sink.is_sent() {
            sink.end();
        }

        Outcome::Handled {
            route: route.info(),
        }
    }

    /// Builds a request from `method` and `target` and dispatches it.
    pub fn resolve_path(&self, method: &str, target: &str, sink: &mut dyn ResponseSink) -> Outcome {
        self.resolve(Request::new(method, target), sink)
    }

    fn find(&self, method: &str, path: &str) -> Result<(&Route, Params)> {
        self.routes
            .iter()
            .filter(|route| route.method.as_str() == method)
            .find_map(|route| route.pattern.matches(path).map(|params| (route, params)))
            .ok_or_else(|| Error::no_route_matched(method, path))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("global_middleware", &self.global.len())
            .field("routes", &self.routes)
            .finish()
    }
}

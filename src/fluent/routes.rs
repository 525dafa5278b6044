//! Route table entries and the pieces they are built from.

use {
    super::{
        middleware::{Middleware, MiddlewareFn},
        pattern::RoutePattern,
        request::Request,
        response::ResponseSink,
    },
    crate::{Error, Result},
    serde::Serialize,
    std::{fmt, str::FromStr, sync::Arc},
};

/// The HTTP methods a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses an exact upper-case method name.
impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(Error::invalid_input(format!(
                "Unsupported HTTP method '{other}', expected GET, POST, PUT or DELETE"
            ))),
        }
    }
}

type HandlerFn = dyn Fn(&Request, &mut dyn ResponseSink) + Send + Sync;

/// A route's callable plus the name shown in route listings.
#[derive(Clone)]
pub struct Handler {
    name: Option<String>,
    f: Arc<HandlerFn>,
}

impl Handler {
    /// An anonymous handler; listed as `Closure`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Request, &mut dyn ResponseSink) + Send + Sync + 'static,
    {
        Self {
            name: None,
            f: Arc::new(f),
        }
    }

    /// A handler listed under `name`, conventionally `Type::method`.
    pub fn named<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Request, &mut dyn ResponseSink) + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            f: Arc::new(f),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Closure")
    }

    pub(crate) fn call(&self, request: &Request, sink: &mut dyn ResponseSink) {
        (self.f)(request, sink)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.display_name()).finish()
    }
}

/// Options for a route group: a path prefix and middleware inherited by
/// every route registered inside it.
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    pub prefix: String,
    pub middleware: Middleware,
}

impl GroupOptions {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            middleware: Middleware::none(),
        }
    }

    #[must_use]
    pub fn with_middleware(mut self, middleware: impl Into<Middleware>) -> Self {
        self.middleware = middleware.into();
        self
    }
}

impl From<&str> for GroupOptions {
    fn from(prefix: &str) -> Self {
        Self::new(prefix)
    }
}

/// A registered route. Immutable once it is in the table.
#[derive(Clone)]
pub struct Route {
    pub(crate) method: HttpMethod,
    pub(crate) pattern: RoutePattern,
    pub(crate) handler: Handler,
    pub(crate) route_middleware: Vec<MiddlewareFn>,
    pub(crate) group_middleware: Vec<MiddlewareFn>,
}

impl Route {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            route: self.pattern.as_str().to_string(),
            method: self.method,
            callback: self.handler.display_name().to_string(),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("handler", &self.handler.display_name())
            .field("route_middleware", &self.route_middleware.len())
            .field("group_middleware", &self.group_middleware.len())
            .finish()
    }
}

/// One line of the route listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub route: String,
    pub method: HttpMethod,
    pub callback: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_is_exact() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("get".parse::<HttpMethod>().is_err());
        assert!("PATCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_route_info_serializes_upper_case_method() {
        let info = RouteInfo {
            route: "/orders/:id".to_string(),
            method: HttpMethod::Put,
            callback: "OrdersController::update".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            serde_json::json!({
                "route": "/orders/:id",
                "method": "PUT",
                "callback": "OrdersController::update",
            })
        );
    }

    #[test]
    fn test_anonymous_handler_is_listed_as_closure() {
        let handler = Handler::new(|_, _| {});
        assert_eq!(handler.display_name(), "Closure");
        let named = Handler::named("Health::check", |_, _| {});
        assert_eq!(named.display_name(), "Health::check");
    }
}

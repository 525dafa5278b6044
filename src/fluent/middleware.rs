//! Middleware functions, references and the registry that resolves them.
//!
//! A middleware is a plain function of the request and the current parameter
//! bag. It either hands a (possibly rewritten) bag to the next stage or halts
//! dispatch with a [`Reply`]. Routes and groups refer to middleware through a
//! [`Middleware`] reference, which is resolved against the registry at
//! registration time into a flat, ordered list of functions.

use {
    super::{params::Params, request::Request, response::Reply},
    crate::{Error, Result},
    std::{collections::HashMap, fmt, sync::Arc},
};

/// What a middleware stage decided.
#[derive(Debug)]
pub enum Flow {
    /// Run the next stage with this parameter bag.
    Continue(Params),
    /// Stop here and send this reply. Later stages and the handler are skipped.
    Halt(Reply),
}

/// A resolved middleware function.
pub type MiddlewareFn = Arc<dyn Fn(&Request, Params) -> Flow + Send + Sync>;

/// A reference to middleware, as accepted by the registration API.
///
/// Anything that converts into a `Middleware` can be passed where middleware
/// is expected: a name (`"auth"`), a list (`vec!["auth".into(), "audit".into()]`),
/// a function wrapped with [`Middleware::func`], or `()` for none.
#[derive(Clone)]
pub enum Middleware {
    Func(MiddlewareFn),
    Named(String),
    List(Vec<Middleware>),
}

impl Middleware {
    /// Wraps a closure as a middleware reference.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Request, Params) -> Flow + Send + Sync + 'static,
    {
        Self::Func(Arc::new(f))
    }

    /// An empty reference; resolves to no middleware.
    pub fn none() -> Self {
        Self::List(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(items) => items.iter().all(Middleware::is_empty),
            Self::Func(_) | Self::Named(_) => false,
        }
    }
}

impl Default for Middleware {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Func(_) => f.write_str("Func(..)"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

impl From<&str> for Middleware {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for Middleware {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Vec<Middleware>> for Middleware {
    fn from(items: Vec<Middleware>) -> Self {
        Self::List(items)
    }
}

impl From<&[&str]> for Middleware {
    fn from(names: &[&str]) -> Self {
        Self::List(names.iter().map(|name| Self::from(*name)).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Middleware {
    fn from(names: [&str; N]) -> Self {
        Self::from(&names[..])
    }
}

impl From<MiddlewareFn> for Middleware {
    fn from(f: MiddlewareFn) -> Self {
        Self::Func(f)
    }
}

impl From<()> for Middleware {
    fn from(_: ()) -> Self {
        Self::none()
    }
}

/// Global and named middleware known to a router.
#[derive(Default, Clone)]
pub struct MiddlewareRegistry {
    global: Vec<MiddlewareFn>,
    named: HashMap<String, MiddlewareFn>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the global chain. Global middleware runs first on every
    /// dispatched route, in the order it was added.
    pub fn add_global(&mut self, f: MiddlewareFn) {
        self.global.push(f);
    }

    /// Registers `f` under `name`, replacing any earlier registration.
    pub fn add_named(&mut self, name: impl Into<String>, f: MiddlewareFn) {
        let name = name.into();
        if self.named.insert(name.clone(), f).is_some() {
            tracing::debug!(middleware = %name, "Replaced named middleware");
        }
    }

    pub fn global(&self) -> &[MiddlewareFn] {
        &self.global
    }

    /// Flattens a reference into the ordered list of functions it denotes.
    ///
    /// # Errors
    ///
    /// Returns `UnknownMiddleware` for the first name, in depth-first order,
    /// that has no registration.
    pub fn resolve(&self, reference: &Middleware) -> Result<Vec<MiddlewareFn>> {
        let mut resolved = Vec::new();
        self.resolve_into(reference, &mut resolved)?;
        Ok(resolved)
    }

    fn resolve_into(&self, reference: &Middleware, out: &mut Vec<MiddlewareFn>) -> Result<()> {
        match reference {
            Middleware::Func(f) => out.push(Arc::clone(f)),
            Middleware::Named(name) => {
                let f = self
                    .named
                    .get(name)
                    .ok_or_else(|| Error::unknown_middleware(name))?;
                out.push(Arc::clone(f));
            }
            Middleware::List(items) => {
                for item in items {
                    self.resolve_into(item, out)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.named.keys().collect();
        names.sort();
        f.debug_struct("MiddlewareRegistry")
            .field("global", &self.global.len())
            .field("named", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn tag(value: &'static str) -> MiddlewareFn {
        Arc::new(move |_: &Request, params: Params| Flow::Continue(params.with("tag", value)))
    }

    fn run(chain: &[MiddlewareFn]) -> Vec<String> {
        let request = Request::new("GET", "/");
        chain
            .iter()
            .map(|f| match f(&request, Params::new()) {
                Flow::Continue(params) => params.get("tag").unwrap_or_default().to_string(),
                Flow::Halt(_) => "halt".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_resolves_nested_lists_depth_first() {
        let mut registry = MiddlewareRegistry::new();
        registry.add_named("a", tag("a"));
        registry.add_named("b", tag("b"));

        let reference = Middleware::List(vec![
            "a".into(),
            Middleware::List(vec![Middleware::Func(tag("f")), "b".into()]),
            ().into(),
        ]);
        let chain = registry.resolve(&reference).unwrap();
        assert_eq!(run(&chain), ["a", "f", "b"]);
    }

    #[test]
    fn test_empty_reference_resolves_to_nothing() {
        let registry = MiddlewareRegistry::new();
        assert!(registry.resolve(&Middleware::none()).unwrap().is_empty());
        assert!(Middleware::from(()).is_empty());
        assert!(!Middleware::from("auth").is_empty());
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        let mut registry = MiddlewareRegistry::new();
        registry.add_named("auth", tag("auth"));
        let Err(err) = registry.resolve(&Middleware::from(["auth", "missing"])) else {
            panic!("unknown middleware name must fail to resolve");
        };
        assert_eq!(err.kind(), ErrorKind::UnknownMiddleware);
        assert_eq!(err.to_string(), "Middleware 'missing' not found.");
    }

    #[test]
    fn test_named_last_write_wins() {
        let mut registry = MiddlewareRegistry::new();
        registry.add_named("auth", tag("first"));
        registry.add_named("auth", tag("second"));
        let chain = registry.resolve(&"auth".into()).unwrap();
        assert_eq!(run(&chain), ["second"]);
    }

    #[test]
    fn test_global_keeps_registration_order() {
        let mut registry = MiddlewareRegistry::new();
        registry.add_global(tag("1"));
        registry.add_global(tag("2"));
        assert_eq!(run(registry.global()), ["1", "2"]);
    }
}

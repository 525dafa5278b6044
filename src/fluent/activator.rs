//! Constructor wiring for controllers.
//!
//! A controller describes its constructor with a list of [`Parameter`]s. The
//! activator walks that list and produces one value per parameter:
//!
//! | declared as                           | supplied value                      |
//! |---------------------------------------|-------------------------------------|
//! | `prefix`, [`Parameter::string`]       | the prefix given to `add_controller`|
//! | `middleware`, [`Parameter::list`]     | the middleware given to it          |
//! | [`Parameter::interface`]              | the bound implementation            |
//! | [`Parameter::component`]              | a shared or freshly created instance |
//! | anything else                         | `UnresolvableParameter`             |
//!
//! Interfaces are bound on the router with [`Bindings::bind`]. A missing
//! binding fails with `UnresolvedDependency`.

use {
    super::middleware::Middleware,
    crate::{Error, Result},
    std::{
        any::{Any, TypeId, type_name},
        collections::HashMap,
        fmt,
        sync::Arc,
    },
};

type AnyValue = Box<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn() -> AnyValue + Send + Sync>;

/// A type the activator can build without arguments.
///
/// Implement [`Component::shared`] to hand out one process-wide instance
/// instead of a new one per activation.
pub trait Component: Send + Sync + 'static {
    fn create() -> Self
    where
        Self: Sized;

    fn shared() -> Option<Arc<Self>>
    where
        Self: Sized,
    {
        None
    }
}

fn instantiate<C: Component>() -> Arc<C> {
    C::shared().unwrap_or_else(|| Arc::new(C::create()))
}

fn make_component<C: Component>() -> AnyValue {
    Box::new(instantiate::<C>())
}

/// The type of a dependency, identified by the `Arc` it is delivered in.
#[derive(Clone, Copy)]
pub struct Dependency {
    id: TypeId,
    name: &'static str,
}

impl Dependency {
    fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<Arc<T>>(),
            name: type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Declared type of a constructor parameter.
#[derive(Clone)]
pub enum ParamKind {
    String,
    List,
    /// A scalar such as `"int"` or `"bool"`.
    Scalar(&'static str),
    /// A non-scalar built-in with no construction strategy.
    Builtin(&'static str),
    Interface(Dependency),
    Component(Dependency, fn() -> AnyValue),
}

impl fmt::Debug for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("String"),
            Self::List => f.write_str("List"),
            Self::Scalar(name) => f.debug_tuple("Scalar").field(name).finish(),
            Self::Builtin(name) => f.debug_tuple("Builtin").field(name).finish(),
            Self::Interface(dep) => f.debug_tuple("Interface").field(dep).finish(),
            Self::Component(dep, _) => f.debug_tuple("Component").field(dep).finish(),
        }
    }
}

/// One entry of a controller's constructor descriptor.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: &'static str,
    kind: ParamKind,
}

impl Parameter {
    pub fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::String,
        }
    }

    pub fn list(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::List,
        }
    }

    pub fn scalar(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Scalar(type_name),
        }
    }

    pub fn builtin(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Builtin(type_name),
        }
    }

    /// A dependency on an interface, usually a trait object: `interface::<dyn Store>("store")`.
    pub fn interface<I: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Interface(Dependency::of::<I>()),
        }
    }

    /// A dependency on a concrete component, constructed on demand.
    pub fn component<C: Component>(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Component(Dependency::of::<C>(), make_component::<C>),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }
}

struct Binding {
    interface: &'static str,
    implementation: &'static str,
    make: Factory,
}

/// Interface to implementation bindings used when activating controllers.
#[derive(Default)]
pub struct Bindings {
    entries: HashMap<TypeId, Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds interface `I` to component `C`. `coerce` turns the component
    /// into the interface, which for a trait object is just `|c| c`.
    /// Rebinding an interface replaces the previous binding.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use kiwi_dispatch::{Bindings, Component};
    ///
    /// trait Clock: Send + Sync {
    ///     fn now(&self) -> u64;
    /// }
    ///
    /// struct Fixed;
    /// impl Clock for Fixed {
    ///     fn now(&self) -> u64 { 7 }
    /// }
    /// impl Component for Fixed {
    ///     fn create() -> Self { Fixed }
    /// }
    ///
    /// let mut bindings = Bindings::new();
    /// bindings.bind::<dyn Clock, Fixed>(|c| c);
    /// assert!(bindings.is_bound::<dyn Clock>());
    /// ```
    pub fn bind<I, C>(&mut self, coerce: fn(Arc<C>) -> Arc<I>)
    where
        I: ?Sized + Send + Sync + 'static,
        C: Component,
    {
        let dependency = Dependency::of::<I>();
        let make: Factory = Arc::new(move || -> AnyValue { Box::new(coerce(instantiate::<C>())) });
        let previous = self.entries.insert(
            dependency.id,
            Binding {
                interface: dependency.name,
                implementation: type_name::<C>(),
                make,
            },
        );
        match previous {
            Some(old) => tracing::debug!(
                interface = dependency.name,
                previous = old.implementation,
                implementation = type_name::<C>(),
                "Rebound interface"
            ),
            None => tracing::debug!(
                interface = dependency.name,
                implementation = type_name::<C>(),
                "Bound interface"
            ),
        }
    }

    pub fn is_bound<I: ?Sized + 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<Arc<I>>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produces one value per declared parameter, or the first resolution error.
    pub fn resolve(
        &self,
        controller: &str,
        parameters: &[Parameter],
        prefix: &str,
        middleware: &Middleware,
    ) -> Result<Arguments> {
        let mut values: HashMap<&'static str, AnyValue> = HashMap::new();

        for parameter in parameters {
            let value: AnyValue = match (&parameter.kind, parameter.name) {
                (ParamKind::String, "prefix") => Box::new(prefix.to_string()),
                (ParamKind::List, "middleware") => Box::new(middleware.clone()),
                (ParamKind::Interface(dependency), _) => {
                    let binding = self.entries.get(&dependency.id).ok_or_else(|| {
                        Error::unresolved_dependency(format!(
                            "No implementation found for interface '{}' required by '{}'",
                            dependency.name, controller
                        ))
                    })?;
                    tracing::trace!(
                        interface = binding.interface,
                        implementation = binding.implementation,
                        controller,
                        "Injecting bound implementation"
                    );
                    (binding.make)()
                }
                (ParamKind::Component(_, make), _) => make(),
                _ => return Err(Error::unresolvable_parameter(parameter.name, controller)),
            };
            values.insert(parameter.name, value);
        }

        Ok(Arguments {
            controller: controller.to_string(),
            values,
        })
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .values()
                    .map(|binding| (binding.interface, binding.implementation)),
            )
            .finish()
    }
}

/// Resolved constructor arguments, looked up by parameter name.
pub struct Arguments {
    controller: String,
    values: HashMap<&'static str, AnyValue>,
}

impl Arguments {
    /// The prefix, when the controller declared a `prefix` parameter.
    pub fn prefix(&self) -> Option<&str> {
        self.get::<String>("prefix").map(String::as_str)
    }

    /// The inherited middleware, when the controller declared a `middleware` parameter.
    pub fn middleware(&self) -> Option<&Middleware> {
        self.get::<Middleware>("middleware")
    }

    /// The dependency injected for parameter `name`.
    ///
    /// # Errors
    ///
    /// `UnresolvedDependency` when no such parameter was declared or it was
    /// declared with a different type.
    pub fn dependency<T: ?Sized + 'static>(&self, name: &str) -> Result<Arc<T>> {
        self.get::<Arc<T>>(name).cloned().ok_or_else(|| {
            Error::unresolved_dependency(format!(
                "'{}' has no dependency '{}' of type '{}'",
                self.controller,
                name,
                type_name::<T>()
            ))
        })
    }

    fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        self.values.get(name)?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Arguments")
            .field("controller", &self.controller)
            .field("names", &names)
            .finish()
    }
}

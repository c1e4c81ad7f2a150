//! `ServicePrototype` and the `Blueprint` trait — the Rust-native substitute
//! for the reflection-based injection-point discovery the spec describes.
//!
//! Rust erases attributes at compile time, so there is nothing for a
//! `TypeAnalyzer` to scan at runtime. Instead, a registered concrete type
//! declares its own constructor parameters, injected properties and injected
//! methods by implementing [`Blueprint`] — the `impl Blueprint for T` block
//! *is* the marker, the same role an `#[Inject]` attribute plays in a
//! reflection-based host. Types that would rather not implement the trait can
//! hand the analyzer the same [`ServicePrototype`] data ad hoc through
//! [`crate::definition::DefinitionBuilder::describe`].

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::id::ServiceId;

/// A type-erased, shareable instance. The container's common currency: every
/// resolved service, factory return value, and extender input/output passes
/// around as one of these until a caller downcasts it back to a concrete type.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Sentinel passed to a constructor/property/method parameter that allows
/// `null` or has a default and has no resolvable dependency. A `Blueprint`
/// implementation downcasts for this to tell "left at default" apart from a
/// real resolved value of some other type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Null;

/// A single constructor (or method) parameter as the analyzer understands it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ParameterPrototype {
    pub name: String,
    /// The abstract id this parameter depends on, or `None` for a parameter
    /// with no resolvable dependency (e.g. a plain literal default).
    pub dependency: Option<ServiceId>,
    pub allows_null: bool,
    pub has_default: bool,
    pub is_variadic: bool,
}

impl ParameterPrototype {
    pub fn required(name: impl Into<String>, dependency: impl Into<ServiceId>) -> Self {
        Self {
            name: name.into(),
            dependency: Some(dependency.into()),
            allows_null: false,
            has_default: false,
            is_variadic: false,
        }
    }

    pub fn nullable(name: impl Into<String>, dependency: impl Into<ServiceId>) -> Self {
        Self {
            name: name.into(),
            dependency: Some(dependency.into()),
            allows_null: true,
            has_default: false,
            is_variadic: false,
        }
    }

    pub fn defaulted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependency: None,
            allows_null: false,
            has_default: true,
            is_variadic: false,
        }
    }
}

/// An injected property, resolved and written after construction.
pub type PropertyPrototype = ParameterPrototype;

/// An injected method: a name plus its own ordered parameter list, invoked
/// after every property has been injected.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MethodPrototype {
    pub name: String,
    pub parameters: Vec<ParameterPrototype>,
}

/// Which lifecycle hooks a type exposes, detected by capability rather than
/// inheritance (a type either overrides `initialize`/`terminate` or it
/// doesn't — there is no base class to inspect).
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct LifecycleFlags {
    pub has_initializer: bool,
    pub has_terminator: bool,
}

/// The analyzed shape of a registered class, as the engine needs it to drive
/// construction and injection.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServicePrototype {
    pub class: String,
    pub is_instantiable: bool,
    pub constructor: Vec<ParameterPrototype>,
    pub injected_properties: Vec<PropertyPrototype>,
    pub injected_methods: Vec<MethodPrototype>,
    pub lifecycle: LifecycleFlags,
}

impl ServicePrototype {
    /// A prototype for a class with no declared injection points — a valid,
    /// cacheable result, not an error (interfaces and marker types get this).
    pub fn not_instantiable(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            is_instantiable: false,
            constructor: Vec::new(),
            injected_properties: Vec::new(),
            injected_methods: Vec::new(),
            lifecycle: LifecycleFlags::default(),
        }
    }

    /// Validates the `BadlyConfiguredService` invariant: every injected
    /// property/method parameter with no default must have a resolvable
    /// dependency id. Called once at analysis time, not at every resolution.
    pub fn validate(&self) -> DiResult<()> {
        let check = |p: &ParameterPrototype| -> DiResult<()> {
            if p.dependency.is_none() && !p.has_default && !p.allows_null {
                return Err(DiError::ContainerException(format!(
                    "{}: parameter `{}` is marked for injection but has no resolvable type and no default value",
                    self.class, p.name
                )));
            }
            Ok(())
        };
        for p in &self.constructor {
            check(p)?;
        }
        for p in &self.injected_properties {
            check(p)?;
        }
        for m in &self.injected_methods {
            for p in &m.parameters {
                check(p)?;
            }
        }
        Ok(())
    }
}

/// The Rust-native discovery-strategy marker: implement this for any
/// concrete type registered with [`crate::definition::DefinitionBuilder::bind`]
/// to describe how it is built and injected.
pub trait Blueprint: Any + Send + Sync + Sized + 'static {
    /// Describes this type's constructor parameters, injected properties and
    /// injected methods. Called once and cached by the analyzer.
    fn blueprint() -> ServicePrototype;

    /// Builds `Self` from resolved constructor arguments, supplied in the
    /// order `blueprint().constructor` declared them.
    fn construct(args: Vec<AnyArc>) -> DiResult<Self>;

    /// Writes one resolved property value. The default implementation is a
    /// no-op, correct for types with no injected properties.
    fn inject_property(&mut self, _name: &str, _value: AnyArc) -> DiResult<()> {
        Ok(())
    }

    /// Invokes one injected method with its resolved arguments.
    fn inject_method(&mut self, _name: &str, _args: Vec<AnyArc>) -> DiResult<()> {
        Ok(())
    }

    /// Runs once, after all injection, if `lifecycle.has_initializer`.
    fn initialize(&mut self) {}

    /// Runs once, at container teardown, if `lifecycle.has_terminator`.
    fn terminate(&mut self) {}
}

/// Type-erased vtable over a [`Blueprint`] implementor, built once at
/// registration time via the generic `of::<T>()` constructor and stored in
/// the [`crate::definition::ServiceDefinition`] so the engine never needs to
/// know `T` again.
#[derive(Clone)]
pub(crate) struct BlueprintVtable {
    pub prototype: Arc<dyn Fn() -> ServicePrototype + Send + Sync>,
    #[allow(clippy::type_complexity)]
    pub construct: Arc<dyn Fn(Vec<AnyArc>) -> DiResult<AnyArc> + Send + Sync>,
    #[allow(clippy::type_complexity)]
    pub inject_property: Arc<dyn Fn(&mut AnyArc, &str, AnyArc) -> DiResult<()> + Send + Sync>,
    #[allow(clippy::type_complexity)]
    pub inject_method: Arc<dyn Fn(&mut AnyArc, &str, Vec<AnyArc>) -> DiResult<()> + Send + Sync>,
    pub initialize: Arc<dyn Fn(&mut AnyArc) -> DiResult<()> + Send + Sync>,
    /// Runs `Blueprint::terminate` if the instance is still exclusively
    /// owned when its scope ends; a no-op best effort otherwise, since the
    /// hook takes `&mut self` and a caller may still hold a clone of the `Arc`.
    pub terminate: Arc<dyn Fn(&mut AnyArc) + Send + Sync>,
}

impl BlueprintVtable {
    pub fn of<T: Blueprint>() -> Self {
        Self {
            prototype: Arc::new(T::blueprint),
            construct: Arc::new(|args| T::construct(args).map(|v| Arc::new(v) as AnyArc)),
            inject_property: Arc::new(|instance, name, value| {
                let concrete = Arc::get_mut(instance)
                    .and_then(|any| any.downcast_mut::<T>())
                    .ok_or_else(|| DiError::ImmutablePropertyInjection(name.to_string()))?;
                concrete.inject_property(name, value)
            }),
            inject_method: Arc::new(|instance, name, args| {
                let concrete = Arc::get_mut(instance)
                    .and_then(|any| any.downcast_mut::<T>())
                    .ok_or_else(|| DiError::ImmutablePropertyInjection(name.to_string()))?;
                concrete.inject_method(name, args)
            }),
            initialize: Arc::new(|instance| {
                if let Some(concrete) = Arc::get_mut(instance).and_then(|any| any.downcast_mut::<T>()) {
                    concrete.initialize();
                }
                Ok(())
            }),
            terminate: Arc::new(|instance| {
                if let Some(concrete) = Arc::get_mut(instance).and_then(|any| any.downcast_mut::<T>()) {
                    concrete.terminate();
                }
            }),
        }
    }

    /// Builds a vtable ad hoc from caller-supplied closures, for a concrete
    /// type that does not implement [`Blueprint`] — the "supply the same
    /// `ServicePrototype` data ad hoc" path spec §4.2.1 calls for, exposed as
    /// [`crate::definition::DefinitionBuilder::describe`]. Property/method
    /// injection and lifecycle hooks default to no-ops, matching
    /// [`Blueprint`]'s own default bodies.
    #[allow(clippy::type_complexity)]
    pub fn describe(
        prototype: impl Fn() -> ServicePrototype + Send + Sync + 'static,
        construct: impl Fn(Vec<AnyArc>) -> DiResult<AnyArc> + Send + Sync + 'static,
    ) -> Self {
        Self {
            prototype: Arc::new(prototype),
            construct: Arc::new(construct),
            inject_property: Arc::new(|_, _, _| Ok(())),
            inject_method: Arc::new(|_, _, _| Ok(())),
            initialize: Arc::new(|_| Ok(())),
            terminate: Arc::new(|_| {}),
        }
    }

    /// Like [`BlueprintVtable::describe`], but also wires ad hoc
    /// property/method injection closures for a described type whose
    /// prototype declares injection points.
    #[allow(clippy::type_complexity)]
    pub fn describe_with_injection(
        prototype: impl Fn() -> ServicePrototype + Send + Sync + 'static,
        construct: impl Fn(Vec<AnyArc>) -> DiResult<AnyArc> + Send + Sync + 'static,
        inject_property: impl Fn(&mut AnyArc, &str, AnyArc) -> DiResult<()> + Send + Sync + 'static,
        inject_method: impl Fn(&mut AnyArc, &str, Vec<AnyArc>) -> DiResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inject_property: Arc::new(inject_property),
            inject_method: Arc::new(inject_method),
            ..Self::describe(prototype, construct)
        }
    }
}

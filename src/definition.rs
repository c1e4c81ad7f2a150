//! `ServiceDefinition`: the registration blueprint stored in the
//! [`crate::store::DefinitionStore`], and the builder used to construct one
//! before the container is sealed.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DiResult;
use crate::id::ServiceId;
use crate::lifetime::Lifetime;
use crate::prototype::{AnyArc, Blueprint, BlueprintVtable, ServicePrototype};

/// An argument value bound to a constructor/factory parameter at registration
/// time, overriding what autowiring would otherwise resolve.
#[derive(Clone)]
pub enum Argument {
    /// A literal, already-constructed value.
    Value(AnyArc),
    /// A reference to another abstract id, resolved when this definition is
    /// built.
    Reference(ServiceId),
}

/// How a definition is realized into an instance.
#[derive(Clone)]
pub enum Concrete {
    /// Autowired construction via a [`Blueprint`]-described type: the engine
    /// resolves constructor parameters, builds the instance, then runs
    /// property and method injection and extenders.
    Class {
        class_name: &'static str,
        vtable: Arc<BlueprintVtable>,
    },
    /// A user factory invoked directly with the resolver; bypasses property
    /// and method injection (construction is considered complete as the
    /// factory returns it), per spec §4.5 Instantiate.
    #[allow(clippy::type_complexity)]
    Factory(Arc<dyn Fn(&dyn crate::engine::Resolve) -> crate::error::DiResult<AnyArc> + Send + Sync>),
    /// An instance already constructed by the caller (`Container::instance`).
    Instance(AnyArc),
}

/// A registration: one abstract id bound to one concrete realization, with a
/// lifetime, tags, and explicit argument overrides.
#[derive(Clone)]
pub struct ServiceDefinition {
    pub id: ServiceId,
    pub concrete: Concrete,
    pub lifetime: Lifetime,
    pub tags: Vec<String>,
    pub arguments: HashMap<String, Argument>,
    /// Ids this definition is "also known as" — the Rust stand-in for a
    /// reflected parent-class/interface chain (see `DESIGN.md`, Open Question
    /// 2). Used by `MatchContextual`'s supertype-walk steps.
    pub also_known_as: Vec<ServiceId>,
}

impl ServiceDefinition {
    pub fn class_name(&self) -> &'static str {
        match &self.concrete {
            Concrete::Class { class_name, .. } => class_name,
            Concrete::Factory(_) => "<factory>",
            Concrete::Instance(_) => "<instance>",
        }
    }
}

/// Fluent builder for one [`ServiceDefinition`], returned by
/// [`crate::container::ContainerBuilder::bind`] /
/// `singleton` / `scoped`.
pub struct DefinitionBuilder<'a> {
    pub(crate) target: &'a mut crate::store::DefinitionStore,
    pub(crate) id: ServiceId,
}

impl<'a> DefinitionBuilder<'a> {
    /// Binds to an autowired class implementing [`Blueprint`].
    pub fn to<T: Blueprint>(self) -> Self {
        let class_name = std::any::type_name::<T>();
        self.target.replace_concrete(
            &self.id,
            Concrete::Class {
                class_name,
                vtable: Arc::new(BlueprintVtable::of::<T>()),
            },
        );
        self
    }

    /// Binds to a type that does not implement [`Blueprint`], supplying the
    /// same constructor-parameter/injection-point data ad hoc (spec §4.2.1's
    /// "any marker mechanism" escape hatch) instead of through an
    /// `impl Blueprint for T` block. Unlike [`DefinitionBuilder::to_factory`],
    /// the described type still goes through PropertyInject/MethodInject and
    /// extenders like an ordinary autowired class — only construction is
    /// caller-supplied.
    pub fn describe(
        self,
        class_name: &'static str,
        prototype: impl Fn() -> ServicePrototype + Send + Sync + 'static,
        construct: impl Fn(Vec<AnyArc>) -> DiResult<AnyArc> + Send + Sync + 'static,
    ) -> Self {
        self.target.replace_concrete(
            &self.id,
            Concrete::Class {
                class_name,
                vtable: Arc::new(BlueprintVtable::describe(prototype, construct)),
            },
        );
        self
    }

    /// Like [`DefinitionBuilder::describe`], but also wires ad hoc
    /// property/method injection closures for a described prototype that
    /// declares injection points.
    pub fn describe_with_injection(
        self,
        class_name: &'static str,
        prototype: impl Fn() -> ServicePrototype + Send + Sync + 'static,
        construct: impl Fn(Vec<AnyArc>) -> DiResult<AnyArc> + Send + Sync + 'static,
        inject_property: impl Fn(&mut AnyArc, &str, AnyArc) -> DiResult<()> + Send + Sync + 'static,
        inject_method: impl Fn(&mut AnyArc, &str, Vec<AnyArc>) -> DiResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.target.replace_concrete(
            &self.id,
            Concrete::Class {
                class_name,
                vtable: Arc::new(BlueprintVtable::describe_with_injection(
                    prototype,
                    construct,
                    inject_property,
                    inject_method,
                )),
            },
        );
        self
    }

    /// Binds to a user factory, bypassing property/method injection.
    pub fn to_factory<F>(self, factory: F) -> Self
    where
        F: Fn(&dyn crate::engine::Resolve) -> crate::error::DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.target
            .replace_concrete(&self.id, Concrete::Factory(Arc::new(factory)));
        self
    }

    pub fn tag(self, tag: impl Into<String>) -> Self {
        self.target.add_tag(&self.id, tag.into());
        self
    }

    pub fn with_argument(self, name: impl Into<String>, value: Argument) -> Self {
        self.target.set_argument(&self.id, name.into(), value);
        self
    }

    /// Bulk form of [`DefinitionBuilder::with_argument`] — binds every
    /// name/value pair in `arguments` at once.
    pub fn with_arguments(self, arguments: HashMap<String, Argument>) -> Self {
        for (name, value) in arguments {
            self.target.set_argument(&self.id, name, value);
        }
        self
    }

    /// Declares a supertype/interface alias for contextual-rule matching (see
    /// `DESIGN.md` Open Question 2).
    pub fn also_known_as(self, id: impl Into<ServiceId>) -> Self {
        self.target.add_also_known_as(&self.id, id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerBuilder;
    use crate::prototype::{LifecycleFlags, ParameterPrototype};

    #[test]
    fn describe_registers_a_type_with_no_blueprint_impl() {
        let mut builder = ContainerBuilder::default();
        builder.instance("Size", Arc::new(7i32));
        builder.singleton("Widget").describe(
            "Widget",
            || ServicePrototype {
                class: "Widget".into(),
                is_instantiable: true,
                constructor: vec![ParameterPrototype::required("size", "Size")],
                injected_properties: Vec::new(),
                injected_methods: Vec::new(),
                lifecycle: LifecycleFlags::default(),
            },
            |mut args| {
                let size = args.pop().and_then(|v| v.downcast::<i32>().ok()).map(|v| *v).unwrap_or(0);
                Ok(Arc::new(size) as AnyArc)
            },
        );
        let container = builder.seal();
        let widget = container.get_by_id("Widget").unwrap();
        assert_eq!(*widget.downcast_ref::<i32>().unwrap(), 7);
    }
}

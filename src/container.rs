//! `ContainerBuilder` / `Container`: the two-phase public facade, mirroring
//! the teacher's `ServiceCollection` (pre-seal builder) / `ServiceProvider`
//! (post-seal runtime) split in `collection/mod.rs` and `provider/mod.rs`.
//!
//! Registration is only valid on the builder; calling [`ContainerBuilder::seal`]
//! freezes the [`crate::store::DefinitionStore`] and hands back a [`Container`]
//! whose only further mutation is [`Container::instance`] — runtime instance
//! binding, which never touches the frozen definitions (spec §3's lifecycle rule).

use std::collections::HashMap;
use std::sync::Arc;

use crate::analyzer::PrototypeFactory;
use crate::config::ContainerConfig;
use crate::context::ResolutionContext;
use crate::definition::{Concrete, DefinitionBuilder, ServiceDefinition};
use crate::engine::ResolutionEngine;
use crate::error::{DiError, DiResult};
use crate::id::ServiceId;
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, NullObserver};
use crate::policy::{AllowlistRule, PolicyGuard, PolicyRule, StrictRule};
use crate::prototype::{AnyArc, Blueprint, BlueprintVtable, ParameterPrototype};
use crate::scope::ScopeRegistry;
use crate::store::DefinitionStore;

/// A pre-seal transform over the definition store — the Rust stand-in for
/// the spec's `AddCompilerPass` hook (§6.1), run once during [`ContainerBuilder::seal`]
/// before the store is frozen.
pub trait CompilerPass: Send + Sync {
    fn apply(&self, store: &mut DefinitionStore);
}

/// The caller-implemented trait behind `Call`'s `ClassName@method` and
/// `[target, method]` shapes (spec §4.6.1): a type declares which parameters
/// its designated call method needs, the same way a [`Blueprint`] declares
/// constructor parameters, and [`Container::call_method`]/[`Container::call_on`]
/// resolve them the same way.
pub trait Callable: Send + Sync + 'static {
    fn call_parameters() -> Vec<ParameterPrototype>
    where
        Self: Sized;

    fn call(&self, args: Vec<AnyArc>) -> DiResult<AnyArc>;
}

/// Mutable pre-seal registration surface.
pub struct ContainerBuilder {
    store: DefinitionStore,
    config: ContainerConfig,
    policy_rules: Vec<Box<dyn PolicyRule>>,
    observer: Option<Arc<dyn DiObserver>>,
    compiler_passes: Vec<Box<dyn CompilerPass>>,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}

impl ContainerBuilder {
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            store: DefinitionStore::new(),
            config,
            policy_rules: Vec::new(),
            observer: None,
            compiler_passes: Vec::new(),
        }
    }

    fn register(&mut self, id: impl Into<ServiceId>, lifetime: Lifetime) -> DefinitionBuilder<'_> {
        let id: ServiceId = id.into();
        self.store.add(ServiceDefinition {
            id: id.clone(),
            concrete: Concrete::Instance(Arc::new(())),
            lifetime,
            tags: Vec::new(),
            arguments: HashMap::new(),
            also_known_as: Vec::new(),
        });
        DefinitionBuilder {
            target: &mut self.store,
            id,
        }
    }

    /// `Bind(id, concrete) -> BindingBuilder`: transient.
    pub fn bind(&mut self, id: impl Into<ServiceId>) -> DefinitionBuilder<'_> {
        self.register(id, Lifetime::Transient)
    }

    /// `Singleton(id, concrete) -> BindingBuilder`.
    pub fn singleton(&mut self, id: impl Into<ServiceId>) -> DefinitionBuilder<'_> {
        self.register(id, Lifetime::Singleton)
    }

    /// `Scoped(id, concrete) -> BindingBuilder`.
    pub fn scoped(&mut self, id: impl Into<ServiceId>) -> DefinitionBuilder<'_> {
        self.register(id, Lifetime::Scoped)
    }

    /// `Instance(id, obj)` at registration time. Equivalent to
    /// `Container::instance`, but available before sealing for a definition
    /// catalog assembled entirely up front.
    pub fn instance(&mut self, id: impl Into<ServiceId>, obj: AnyArc) -> &mut Self {
        self.store.add(ServiceDefinition {
            id: id.into(),
            concrete: Concrete::Instance(obj),
            lifetime: Lifetime::Singleton,
            tags: Vec::new(),
            arguments: HashMap::new(),
            also_known_as: Vec::new(),
        });
        self
    }

    /// `Extend(id, fn(instance, container) -> instance)`.
    pub fn extend<F>(&mut self, id: impl Into<ServiceId>, f: F) -> &mut Self
    where
        F: Fn(AnyArc, &dyn crate::engine::Resolve) -> AnyArc + Send + Sync + 'static,
    {
        self.store.add_extender(id.into(), Arc::new(f));
        self
    }

    /// `When(consumer).Needs(abstract).Give(concrete)`.
    pub fn when(&mut self, consumer: impl Into<String>) -> WhenBuilder<'_> {
        WhenBuilder {
            builder: self,
            consumer: consumer.into(),
        }
    }

    /// `Tag(ids, tags)`: bulk-tags an already-registered set of ids.
    pub fn tag(&mut self, ids: &[&str], tags: &[&str]) -> &mut Self {
        for id in ids {
            for tag in tags {
                self.store.add_tag(&ServiceId::new(*id), (*tag).to_string());
            }
        }
        self
    }

    pub fn add_compiler_pass(&mut self, pass: Box<dyn CompilerPass>) -> &mut Self {
        self.compiler_passes.push(pass);
        self
    }

    /// Adds a policy rule beyond the `strict`/`allowed_namespaces` rules the
    /// config already implies.
    pub fn policy_rule(&mut self, rule: Box<dyn PolicyRule>) -> &mut Self {
        self.policy_rules.push(rule);
        self
    }

    pub fn observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observer = Some(observer);
        self
    }

    /// Runs compiler passes, builds the policy guard from config plus any
    /// explicit rules, freezes the store, and (if `config.compile`) eagerly
    /// analyzes every registered class before returning the sealed [`Container`].
    pub fn seal(mut self) -> Container {
        for pass in &self.compiler_passes {
            pass.apply(&mut self.store);
        }

        let mut policy = PolicyGuard::new();
        if self.config.strict {
            policy = policy.with_rule(Box::new(StrictRule));
        }
        if !self.config.allowed_namespaces.is_empty() {
            policy = policy.with_rule(Box::new(AllowlistRule {
                prefixes: self.config.allowed_namespaces.clone(),
            }));
        }
        for rule in self.policy_rules {
            policy = policy.with_rule(rule);
        }

        let analyzer = PrototypeFactory::new(self.config.cache_dir.clone());
        if self.config.compile {
            for def in self.store.iter() {
                if let Concrete::Class { class_name, vtable } = &def.concrete {
                    if let Err(err) = analyzer.analyze(class_name, vtable.prototype.as_ref()) {
                        tracing::warn!(class = class_name, %err, "compile-time prototype analysis failed");
                    }
                }
            }
        }

        self.store.seal();
        let observer = self.observer.unwrap_or_else(|| Arc::new(NullObserver) as Arc<dyn DiObserver>);
        let engine = ResolutionEngine::new(
            Arc::new(self.store),
            Arc::new(ScopeRegistry::new()),
            Arc::new(analyzer),
            Arc::new(policy),
            observer,
            self.config.max_resolution_depth,
        );
        Container {
            engine: Arc::new(engine),
        }
    }
}

/// Returned by [`ContainerBuilder::when`]; completes a contextual rule.
pub struct WhenBuilder<'a> {
    builder: &'a mut ContainerBuilder,
    consumer: String,
}

impl<'a> WhenBuilder<'a> {
    pub fn needs(self, needs: impl Into<ServiceId>) -> NeedsBuilder<'a> {
        NeedsBuilder {
            builder: self.builder,
            consumer: self.consumer,
            needs: needs.into(),
        }
    }
}

pub struct NeedsBuilder<'a> {
    builder: &'a mut ContainerBuilder,
    consumer: String,
    needs: ServiceId,
}

impl NeedsBuilder<'_> {
    pub fn give(self, concrete: impl Into<ServiceId>) {
        self.builder.store.add_contextual(self.consumer, self.needs, concrete.into());
    }
}

/// The sealed, read-only runtime facade (spec §4.6).
#[derive(Clone)]
pub struct Container {
    engine: Arc<ResolutionEngine>,
}

impl Container {
    /// `Get(id) -> instance`, autowiring `T` if `id` has no registration —
    /// only possible here because `T` is statically known at the call site.
    pub fn get<T: Blueprint>(&self, id: impl Into<ServiceId>) -> DiResult<Arc<T>> {
        let id: ServiceId = id.into();
        let autowire = ServiceDefinition {
            id: id.clone(),
            concrete: Concrete::Class {
                class_name: std::any::type_name::<T>(),
                vtable: Arc::new(BlueprintVtable::of::<T>()),
            },
            lifetime: Lifetime::Transient,
            tags: Vec::new(),
            arguments: HashMap::new(),
            also_known_as: Vec::new(),
        };
        let any = self.engine.resolve_root(&id, HashMap::new(), Some(autowire), false)?;
        any.downcast::<T>()
            .map_err(|_| DiError::ContainerException(format!("`{id}` did not resolve to the requested type")))
    }

    /// `Get(id) -> instance`, with no autowiring fallback: fails
    /// `ServiceNotFound` if `id` has no registration.
    pub fn get_by_id(&self, id: impl Into<ServiceId>) -> DiResult<AnyArc> {
        self.engine.resolve_root(&id.into(), HashMap::new(), None, false)
    }

    /// `Has(id) -> bool`: never fails.
    pub fn has(&self, id: impl Into<ServiceId>) -> bool {
        let id: ServiceId = id.into();
        self.engine.store().has(id.as_str()) || self.engine.scopes().get(&id).is_some()
    }

    /// `Make(id, overrides) -> instance`: bypasses the singleton/scoped cache.
    pub fn make(&self, id: impl Into<ServiceId>, overrides: HashMap<String, AnyArc>) -> DiResult<AnyArc> {
        self.engine.resolve_root(&id.into(), overrides, None, true)
    }

    /// `Call(closure, overrides) -> result`: the direct-closure shape of
    /// `Call`, resolving `params` the same way constructor parameters are
    /// resolved and invoking `f` with the resolved arguments in order.
    pub fn call<R>(
        &self,
        params: &[ParameterPrototype],
        overrides: HashMap<String, AnyArc>,
        f: impl FnOnce(Vec<AnyArc>) -> DiResult<R>,
    ) -> DiResult<R> {
        let args = self.resolve_call_args(params, overrides)?;
        f(args)
    }

    /// `Call("ClassName@method", overrides)`: `id` is resolved via `Get`
    /// (spec §4.6.1), then its designated call method is invoked through the
    /// caller-supplied [`Callable`] bound.
    pub fn call_method<T: Callable>(
        &self,
        id: impl Into<ServiceId>,
        overrides: HashMap<String, AnyArc>,
    ) -> DiResult<AnyArc> {
        let id: ServiceId = id.into();
        let receiver = self.get_by_id(id.clone())?;
        let target = receiver
            .downcast_ref::<T>()
            .ok_or_else(|| DiError::ContainerException(format!("`{id}` does not implement the requested callable")))?;
        let args = self.resolve_call_args(&T::call_parameters(), overrides)?;
        target.call(args)
    }

    /// `Call([target, method], overrides)`: `target` is already resolved;
    /// only its designated call method runs.
    pub fn call_on<T: Callable>(&self, target: &AnyArc, overrides: HashMap<String, AnyArc>) -> DiResult<AnyArc> {
        let typed = target
            .downcast_ref::<T>()
            .ok_or_else(|| DiError::ContainerException("target does not implement the requested callable".to_string()))?;
        let args = self.resolve_call_args(&T::call_parameters(), overrides)?;
        typed.call(args)
    }

    fn resolve_call_args(
        &self,
        params: &[ParameterPrototype],
        overrides: HashMap<String, AnyArc>,
    ) -> DiResult<Vec<AnyArc>> {
        let mut ctx = ResolutionContext::root(ServiceId::new("<call>"));
        ctx.overrides = overrides;
        let synthetic = synthetic_definition(ctx.service_id.clone());
        params
            .iter()
            .map(|p| self.engine.resolve_parameter(&ctx, &synthetic, p))
            .collect()
    }

    /// `InjectInto(instance) -> instance`: runs PropertyInject then
    /// MethodInject only — no constructor, extenders, or lifecycle hooks.
    pub fn inject_into<T: Blueprint>(&self, instance: T) -> DiResult<T> {
        let proto = T::blueprint();
        proto.validate()?;
        let vtable = BlueprintVtable::of::<T>();
        let mut any: AnyArc = Arc::new(instance);

        let ctx = ResolutionContext::root(ServiceId::new(format!("<inject:{}>", std::any::type_name::<T>())));
        let synthetic = synthetic_definition(ctx.service_id.clone());

        for prop in &proto.injected_properties {
            let value = self.engine.resolve_parameter(&ctx, &synthetic, prop)?;
            (vtable.inject_property)(&mut any, &prop.name, value)?;
        }
        for method in &proto.injected_methods {
            let mut args = Vec::with_capacity(method.parameters.len());
            for p in &method.parameters {
                args.push(self.engine.resolve_parameter(&ctx, &synthetic, p)?);
            }
            (vtable.inject_method)(&mut any, &method.name, args)?;
        }

        let typed = any
            .downcast::<T>()
            .map_err(|_| DiError::ContainerException("inject_into: unexpected type after injection".to_string()))?;
        Arc::try_unwrap(typed)
            .map_err(|_| DiError::ContainerException("inject_into: instance has outstanding references".to_string()))
    }

    /// `CanInject(instance) -> bool`.
    pub fn can_inject<T: Blueprint>(&self) -> bool {
        let proto = T::blueprint();
        !proto.injected_properties.is_empty() || !proto.injected_methods.is_empty()
    }

    /// `BeginScope()`.
    pub fn begin_scope(&self) {
        self.engine.scopes().begin_scope();
    }

    /// `EndScope()`: pops the innermost scope frame and runs its synchronous
    /// disposers in LIFO order. Use [`Container::end_scope_async`] if any
    /// disposer is an [`crate::dispose::AsyncDispose`] registered via
    /// `defer_async_dispose`.
    pub fn end_scope(&self) -> DiResult<()> {
        let mut bag = self.engine.scopes().end_scope()?;
        bag.run_all_sync_reverse();
        Ok(())
    }

    #[cfg(feature = "async")]
    pub async fn end_scope_async(&self) -> DiResult<()> {
        let mut bag = self.engine.scopes().end_scope()?;
        bag.run_all_async_reverse().await;
        bag.run_all_sync_reverse();
        Ok(())
    }

    /// `Instance(id, obj)`: the one post-seal mutation allowed — binds `obj`
    /// as a singleton with no accompanying definition. Subsequent `Get(id)`
    /// returns it directly (cache-hit, ahead of `Guard`/`DefinitionLookup`).
    pub fn instance(&self, id: impl Into<ServiceId>, obj: AnyArc) {
        self.engine.scopes().set_singleton(id.into(), obj);
    }

    /// Clears every scope frame (including the root singleton frame) and
    /// runs every disposer collected across them, LIFO within each frame,
    /// innermost frame first.
    pub fn shutdown(&self) {
        let mut bag = self.engine.scopes().clear();
        bag.run_all_sync_reverse();
        self.engine.clear_prototype_cache();
    }
}

fn synthetic_definition(id: ServiceId) -> ServiceDefinition {
    ServiceDefinition {
        id,
        concrete: Concrete::Instance(Arc::new(())),
        lifetime: Lifetime::Transient,
        tags: Vec::new(),
        arguments: HashMap::new(),
        also_known_as: Vec::new(),
    }
}

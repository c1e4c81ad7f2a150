//! `ResolutionEngine`: drives one `(abstract id, overrides, context)` through
//! the spec §4.5 pipeline: Guard -> DefinitionLookup -> ContextualRewrite ->
//! Analyze -> Instantiate -> PropertyInject -> MethodInject -> ExtenderApply
//! -> Store -> Initialize.
//!
//! Cache-hit handling (spec §4.5's `CacheHit`) runs before `Guard`, not
//! between `ContextualRewrite` and `Analyze`: an instance already living in
//! the `ScopeRegistry` — whether resolved normally or registered directly via
//! `Container::instance` with no definition at all — must short-circuit
//! unconditionally, and `Instance` bindings have nothing for `Guard` or
//! `DefinitionLookup` to usefully check. See `DESIGN.md`, Open Question 7.
//!
//! Modeled on `ferrous-di`'s per-lifetime dispatch in `provider/mod.rs`
//! (`resolve_any_impl`), generalized from a `TypeId` match to this store's
//! string ids and explicit stage sequence, and on its double-checked
//! per-type lock for concurrent singleton construction.

use std::collections::HashMap;
use std::sync::Arc;

use crate::analyzer::PrototypeFactory;
use crate::context::ResolutionContext;
use crate::definition::{Argument, Concrete, ServiceDefinition};
use crate::error::{DiError, DiResult};
use crate::extender;
use crate::id::ServiceId;
use crate::internal::sync::Mutex;
use crate::lifetime::Lifetime;
use crate::observer::{DiEvent, DiObserver};
use crate::policy::{PolicyGuard, Verdict};
use crate::prototype::{AnyArc, ParameterPrototype, ServicePrototype};
use crate::scope::ScopeRegistry;
use crate::store::DefinitionStore;

/// A resolver interface factories and extenders are handed so they can pull
/// further collaborators out of the container without seeing the engine's
/// internals. Object-safe so it can cross a `Fn` boundary as `&dyn Resolve`.
pub trait Resolve: Send + Sync {
    fn resolve(&self, id: &ServiceId) -> DiResult<AnyArc>;

    /// Registers a synchronous cleanup hook on the scope frame this
    /// resolution is running in, run LIFO when that scope ends (or at
    /// container teardown for the root frame). For a factory or extender
    /// that acquires a resource needing explicit teardown.
    fn defer_dispose(&self, f: Box<dyn FnOnce() + Send>);
}

/// Drives one resolution tree. Shared (via `Arc`) between the `Container`
/// facade and every `ResolveHandle` a factory or extender receives.
pub(crate) struct ResolutionEngine {
    store: Arc<DefinitionStore>,
    scopes: Arc<ScopeRegistry>,
    analyzer: Arc<PrototypeFactory>,
    policy: Arc<PolicyGuard>,
    observer: Arc<dyn DiObserver>,
    max_depth: usize,
    /// Per-id construction locks so concurrent `Get` of the same
    /// Singleton/Scoped id yields one instance, never two (spec §5).
    locks: Mutex<HashMap<ServiceId, Arc<Mutex<()>>>>,
}

impl ResolutionEngine {
    pub(crate) fn new(
        store: Arc<DefinitionStore>,
        scopes: Arc<ScopeRegistry>,
        analyzer: Arc<PrototypeFactory>,
        policy: Arc<PolicyGuard>,
        observer: Arc<dyn DiObserver>,
        max_depth: usize,
    ) -> Self {
        Self {
            store,
            scopes,
            analyzer,
            policy,
            observer,
            max_depth,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn scopes(&self) -> &ScopeRegistry {
        &self.scopes
    }

    pub(crate) fn store(&self) -> &DefinitionStore {
        &self.store
    }

    pub(crate) fn clear_prototype_cache(&self) {
        self.analyzer.clear();
    }

    /// Entry point for `Container::get`/`Container::make`. `autowire` is the
    /// synthesized transient definition a generic `get::<T: Blueprint>()`
    /// call can offer when the store has no registration for `id` (spec
    /// §4.5 DefinitionLookup's autowiring path — there is no runtime class
    /// loader to fall back to, so only a call site that statically knows
    /// `T`'s vtable can offer one). `bypass_cache` is `Make`'s "always fresh"
    /// behavior (invariant 4).
    pub(crate) fn resolve_root(
        &self,
        id: &ServiceId,
        overrides: HashMap<String, AnyArc>,
        autowire: Option<ServiceDefinition>,
        bypass_cache: bool,
    ) -> DiResult<AnyArc> {
        let mut ctx = ResolutionContext::root(id.clone());
        ctx.overrides = overrides;
        self.resolve_in(ctx, autowire, bypass_cache).map_err(|e| {
            self.observer.observe(DiEvent::Failed {
                service_id: id.as_str(),
                error: &e.to_string(),
            });
            e
        })
    }

    fn emit_stage(&self, ctx: &ResolutionContext, stage: &'static str) {
        self.observer.observe(DiEvent::Stage {
            service_id: ctx.service_id.as_str(),
            stage,
            depth: ctx.depth,
        });
    }

    pub(crate) fn resolve_in(
        &self,
        mut ctx: ResolutionContext,
        autowire: Option<ServiceDefinition>,
        bypass_cache: bool,
    ) -> DiResult<AnyArc> {
        let id = ctx.service_id.clone();

        if !bypass_cache {
            if let Some(hit) = self.scopes.get(&id) {
                self.observer.observe(DiEvent::CacheHit { service_id: id.as_str() });
                return Ok(hit);
            }
        }

        ctx.record("Guard");
        self.emit_stage(&ctx, "Guard");
        let known = self.store.has(id.as_str()) || autowire.is_some();
        if let Verdict::Deny(reason) = self.policy.check(&id, known) {
            return Err(DiError::PolicyBlocked(reason));
        }

        ctx.record("DefinitionLookup");
        self.emit_stage(&ctx, "DefinitionLookup");
        let mut definition = match self.store.get(id.as_str()) {
            Some(def) => def.clone(),
            None => match autowire {
                Some(def) => def,
                None => return Err(DiError::ServiceNotFound(id.as_str().to_string())),
            },
        };

        ctx.record("ContextualRewrite");
        self.emit_stage(&ctx, "ContextualRewrite");
        if let Some(consumer) = ctx.consumer {
            if let Some(replacement_id) = self.store.match_contextual(consumer, &id) {
                if let Some(replacement_def) = self.store.get(replacement_id.as_str()) {
                    definition.concrete = replacement_def.concrete.clone();
                }
            }
        }

        let instance = if !bypass_cache && definition.lifetime != Lifetime::Transient {
            self.construct_locked(&ctx, &id, &definition)?
        } else {
            self.construct(&ctx, &definition)?
        };

        ctx.record("Initialize");
        self.emit_stage(&ctx, "Initialize");
        Ok(instance)
    }

    /// Runs Analyze..Store under this id's per-id construction lock, with a
    /// double-checked cache re-read immediately after acquiring it, so two
    /// threads racing to build the same singleton/scoped id never both win
    /// (spec §5).
    fn construct_locked(
        &self,
        ctx: &ResolutionContext,
        id: &ServiceId,
        definition: &ServiceDefinition,
    ) -> DiResult<AnyArc> {
        let lock = {
            let mut locks = self.locks.lock();
            locks.entry(id.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        let _guard = lock.lock();

        if let Some(hit) = self.scopes.get(id) {
            self.observer.observe(DiEvent::CacheHit { service_id: id.as_str() });
            return Ok(hit);
        }

        let instance = self.construct(ctx, definition)?;

        match definition.lifetime {
            Lifetime::Singleton => self.scopes.set_singleton(id.clone(), instance.clone()),
            Lifetime::Scoped => self.scopes.set_scoped(id.clone(), instance.clone())?,
            Lifetime::Transient => unreachable!("construct_locked is only called for non-Transient lifetimes"),
        }

        self.register_terminator(definition, &instance);

        Ok(instance)
    }

    /// If `definition`'s prototype declares `hasTerminator` (spec §4.2), schedule
    /// `Blueprint::terminate` to run once this id's owning frame is torn down: the
    /// root frame for Singleton (via `push_root_disposer`, so a nested scope active
    /// at construction time doesn't misfile it), the current frame for Scoped.
    fn register_terminator(&self, definition: &ServiceDefinition, instance: &AnyArc) {
        let Concrete::Class { class_name, vtable } = &definition.concrete else {
            return;
        };
        let Ok(proto) = self.analyzer.analyze(class_name, vtable.prototype.as_ref()) else {
            return;
        };
        if !proto.lifecycle.has_terminator {
            return;
        }
        let terminate = vtable.terminate.clone();
        let mut captured = instance.clone();
        let disposer: Box<dyn FnOnce() + Send> = Box::new(move || terminate(&mut captured));
        match definition.lifetime {
            Lifetime::Singleton => self.scopes.push_root_disposer(disposer),
            Lifetime::Scoped => self.scopes.push_sync_disposer(disposer),
            Lifetime::Transient => {}
        }
    }

    /// Runs Analyze, Instantiate, PropertyInject, MethodInject and
    /// ExtenderApply for `definition`, without touching the scope registry —
    /// the caller decides whether and where to store the result.
    fn construct(&self, ctx: &ResolutionContext, definition: &ServiceDefinition) -> DiResult<AnyArc> {
        let id = &definition.id;

        self.emit_stage(ctx, "Analyze");
        let prototype = match &definition.concrete {
            Concrete::Class { class_name, vtable } => {
                Some(self.analyzer.analyze(class_name, vtable.prototype.as_ref())?)
            }
            _ => None,
        };

        self.emit_stage(ctx, "Instantiate");
        let (mut instance, freshly_constructed) = self.instantiate(ctx, definition, prototype.as_ref())?;
        if let Some(proto) = &prototype {
            self.observer.observe(DiEvent::Constructed {
                service_id: id.as_str(),
                class: &proto.class,
            });
        }

        if freshly_constructed {
            if let (Some(proto), Concrete::Class { vtable, .. }) = (&prototype, &definition.concrete) {
                self.emit_stage(ctx, "PropertyInject");
                for prop in &proto.injected_properties {
                    let value = self.resolve_parameter(ctx, definition, prop)?;
                    (vtable.inject_property)(&mut instance, &prop.name, value)?;
                }

                self.emit_stage(ctx, "MethodInject");
                for method in &proto.injected_methods {
                    let mut args = Vec::with_capacity(method.parameters.len());
                    for p in &method.parameters {
                        args.push(self.resolve_parameter(ctx, definition, p)?);
                    }
                    (vtable.inject_method)(&mut instance, &method.name, args)?;
                }

                if proto.lifecycle.has_initializer {
                    (vtable.initialize)(&mut instance)?;
                }
            }
        }

        self.emit_stage(ctx, "ExtenderApply");
        let fns = self.store.extenders_for(id);
        if !fns.is_empty() {
            let handle = ResolveHandle {
                engine: self,
                parent: Arc::new(ctx.clone()),
            };
            instance = extender::apply(&fns, instance, &handle);
            self.observer.observe(DiEvent::ExtenderApplied { service_id: id.as_str() });
        }

        self.emit_stage(ctx, "Store");
        Ok(instance)
    }

    fn instantiate(
        &self,
        ctx: &ResolutionContext,
        definition: &ServiceDefinition,
        prototype: Option<&ServicePrototype>,
    ) -> DiResult<(AnyArc, bool)> {
        match &definition.concrete {
            Concrete::Instance(existing) => Ok((existing.clone(), false)),
            Concrete::Factory(factory) => {
                let handle = ResolveHandle {
                    engine: self,
                    parent: Arc::new(ctx.clone()),
                };
                let built = factory(&handle)?;
                Ok((built, false))
            }
            Concrete::Class { vtable, .. } => {
                let proto = prototype.expect("Analyze stage populates the prototype for Class concretes");
                let mut args = Vec::with_capacity(proto.constructor.len());
                for param in &proto.constructor {
                    args.push(self.resolve_parameter(ctx, definition, param)?);
                }
                let built = (vtable.construct)(args)?;
                Ok((built, true))
            }
        }
    }

    /// Resolves one constructor/property/method parameter following spec
    /// §4.5's precedence: a per-call override wins, then an explicit
    /// registration-time argument, then recursive autowiring, then `null`/the
    /// default for parameters that allow it.
    ///
    /// Exposed crate-wide (not just to `construct`) so `Container::inject_into`
    /// and `Container::call`/`call_method` can resolve one-off parameter lists
    /// against a synthetic definition, without going through the full
    /// `resolve_in` pipeline meant for registered ids.
    pub(crate) fn resolve_parameter(
        &self,
        ctx: &ResolutionContext,
        definition: &ServiceDefinition,
        param: &ParameterPrototype,
    ) -> DiResult<AnyArc> {
        if let Some(value) = ctx.overrides.get(&param.name) {
            return Ok(value.clone());
        }
        if let Some(arg) = definition.arguments.get(&param.name) {
            return match arg {
                Argument::Value(v) => Ok(v.clone()),
                Argument::Reference(dep_id) => {
                    let child = ResolutionContext::child(
                        Arc::new(ctx.clone()),
                        dep_id.clone(),
                        Some(definition.class_name()),
                        self.max_depth,
                    )?;
                    self.resolve_in(child, None, false)
                }
            };
        }
        if let Some(dep_id) = &param.dependency {
            let child = ResolutionContext::child(
                Arc::new(ctx.clone()),
                dep_id.clone(),
                Some(definition.class_name()),
                self.max_depth,
            )?;
            return self.resolve_in(child, None, false);
        }
        if param.allows_null || param.has_default {
            return Ok(Arc::new(crate::prototype::Null) as AnyArc);
        }
        Err(DiError::ContainerException(format!(
            "{}: parameter `{}` is marked for injection but has no resolvable type and no default value",
            definition.class_name(),
            param.name
        )))
    }
}

/// The `Resolve` handle passed to a running factory or extender. Its `parent`
/// is the context of the service currently under construction, so anything
/// it resolves participates in the same cycle-detection and depth-tracking
/// chain — but with no known consumer class (a factory/extender is opaque to
/// contextual matching, see spec §9's callable-shape note).
struct ResolveHandle<'a> {
    engine: &'a ResolutionEngine,
    parent: Arc<ResolutionContext>,
}

impl Resolve for ResolveHandle<'_> {
    fn resolve(&self, id: &ServiceId) -> DiResult<AnyArc> {
        let child = ResolutionContext::child(self.parent.clone(), id.clone(), None, self.engine.max_depth)?;
        self.engine.resolve_in(child, None, false)
    }

    fn defer_dispose(&self, f: Box<dyn FnOnce() + Send>) {
        self.engine.scopes.push_sync_disposer(f);
    }
}

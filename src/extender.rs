//! Extenders: post-construction transforms applied in registration order,
//! `(abstract -> fn(instance, container) -> instance)`, with a wildcard
//! (`"*"`) bucket that runs after an id's own specific extenders.
//!
//! Adapted from `ferrous-di`'s `DecorationPipeline`
//! (`decoration.rs`), which keys decorators by `TypeId` and wraps them in
//! generic `ServiceDecorator<T>`/`TraitDecorator<T>` traits. This container
//! is dynamic and string-keyed, so the pipeline here stores type-erased
//! closures directly instead of a generic trait object per decorator.

use std::sync::Arc;

use crate::id::ServiceId;
use crate::prototype::AnyArc;

/// A single extender: given the freshly built (and already injected)
/// instance and a resolver to pull further collaborators from, returns the
/// instance that should replace it for the rest of resolution.
pub(crate) type ExtenderFn = Arc<dyn Fn(AnyArc, &dyn crate::engine::Resolve) -> AnyArc + Send + Sync>;

/// Applies every extender registered for `id`, in order, to `instance`.
pub(crate) fn apply(
    extenders: &[ExtenderFn],
    mut instance: AnyArc,
    resolver: &dyn crate::engine::Resolve,
) -> AnyArc {
    for f in extenders {
        instance = f(instance, resolver);
    }
    instance
}

/// The registration-order, specific-then-wildcard extender index for a
/// [`crate::store::DefinitionStore`].
#[derive(Default)]
pub(crate) struct ExtenderIndex {
    specific: std::collections::HashMap<ServiceId, Vec<ExtenderFn>>,
    wildcard: Vec<ExtenderFn>,
}

impl ExtenderIndex {
    pub(crate) fn add(&mut self, abstract_id: &ServiceId, f: ExtenderFn) {
        if abstract_id.as_str() == "*" {
            self.wildcard.push(f);
        } else {
            self.specific.entry(abstract_id.clone()).or_default().push(f);
        }
    }

    /// Specific extenders first, then wildcard — the ordering spec §5 names.
    pub(crate) fn for_id(&self, id: &ServiceId) -> Vec<ExtenderFn> {
        let mut out: Vec<ExtenderFn> = self.specific.get(id).cloned().unwrap_or_default();
        out.extend(self.wildcard.iter().cloned());
        out
    }
}

//! `DefinitionStore`: the insertion-ordered map from abstract id to
//! [`ServiceDefinition`], plus the four derived indices the spec names —
//! tags, contextual overrides, extenders, and a memoized contextual match
//! cache. Frozen by [`DefinitionStore::seal`].
//!
//! The hybrid Vec/HashMap layout and the finalize-on-seal slot assignment are
//! ported from `ferrous-di`'s `Registry` (`registration.rs`): a linear Vec
//! scan is faster than hashing for the handful of services most containers
//! register, so the Vec is tried first and only overflow spills into a
//! HashMap.

use std::sync::RwLock;

use crate::definition::{Argument, Concrete, ServiceDefinition};
use crate::extender::{ExtenderFn, ExtenderIndex};
use crate::glob;
use crate::id::ServiceId;
use crate::internal::fast_map::{self, FastMap};
use crate::lifetime::Lifetime;

const SMALL_THRESHOLD: usize = 16;

/// One `When(consumer).Needs(needs).Give(concrete)` rule.
#[derive(Clone)]
pub struct ContextualRule {
    pub consumer: String,
    pub needs: ServiceId,
    pub concrete: ServiceId,
}

struct ContextualIndex {
    direct: FastMap<(String, ServiceId), ServiceId>,
    wildcard: Vec<ContextualRule>,
    /// Memoized `(consumer, needs) -> Option<concrete>`; flushed on any write.
    cache: RwLock<FastMap<(String, ServiceId), Option<ServiceId>>>,
}

impl Default for ContextualIndex {
    fn default() -> Self {
        Self {
            direct: fast_map::new(),
            wildcard: Vec::new(),
            cache: RwLock::new(fast_map::new()),
        }
    }
}

impl ContextualIndex {
    fn add(&mut self, rule: ContextualRule) {
        if rule.consumer.contains('*') {
            self.wildcard.push(rule);
        } else {
            self.direct
                .insert((rule.consumer.clone(), rule.needs.clone()), rule.concrete);
        }
        self.cache.write().unwrap().clear();
    }
}

/// Mutable pre-seal, frozen post-seal, per spec §3's lifecycle rule.
pub struct DefinitionStore {
    small: Vec<(ServiceId, ServiceDefinition)>,
    large: FastMap<ServiceId, ServiceDefinition>,
    tag_index: FastMap<String, Vec<ServiceId>>,
    contextual: ContextualIndex,
    extenders: ExtenderIndex,
    sealed: bool,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self {
            small: Vec::new(),
            large: fast_map::new(),
            tag_index: fast_map::new(),
            contextual: ContextualIndex::default(),
            extenders: ExtenderIndex::default(),
            sealed: false,
        }
    }

    /// Inserts or replaces a definition. A no-op past `seal()`.
    pub fn add(&mut self, def: ServiceDefinition) {
        debug_assert!(!self.sealed, "DefinitionStore mutated after seal");
        for tag in &def.tags {
            self.index_tag(tag.clone(), def.id.clone());
        }
        self.insert(def.id.clone(), def);
    }

    fn insert(&mut self, id: ServiceId, def: ServiceDefinition) {
        if let Some(pos) = self.small.iter().position(|(k, _)| k == &id) {
            self.small[pos] = (id, def);
            return;
        }
        if self.small.len() < SMALL_THRESHOLD {
            self.small.push((id, def));
        } else {
            self.large.insert(id, def);
        }
    }

    pub fn get(&self, id: &str) -> Option<&ServiceDefinition> {
        for (k, v) in &self.small {
            if k.as_str() == id {
                return Some(v);
            }
        }
        self.large.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut ServiceDefinition> {
        for (k, v) in &mut self.small {
            if k.as_str() == id {
                return Some(v);
            }
        }
        self.large.get_mut(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.small.iter().any(|(k, _)| k.as_str() == id) || self.large.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.small.iter().map(|(_, v)| v).chain(self.large.values())
    }

    fn index_tag(&mut self, tag: String, id: ServiceId) {
        self.tag_index.entry(tag).or_default().push(id);
    }

    pub fn ids_for_tag(&self, tag: &str) -> &[ServiceId] {
        self.tag_index.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn replace_concrete(&mut self, id: &ServiceId, concrete: Concrete) {
        if let Some(def) = self.get_mut(id.as_str()) {
            def.concrete = concrete;
        } else {
            self.add(ServiceDefinition {
                id: id.clone(),
                concrete,
                lifetime: Lifetime::Transient,
                tags: Vec::new(),
                arguments: Default::default(),
                also_known_as: Vec::new(),
            });
        }
    }

    pub(crate) fn add_tag(&mut self, id: &ServiceId, tag: String) {
        self.index_tag(tag.clone(), id.clone());
        if let Some(def) = self.get_mut(id.as_str()) {
            def.tags.push(tag);
        }
    }

    pub(crate) fn set_argument(&mut self, id: &ServiceId, name: String, value: Argument) {
        if let Some(def) = self.get_mut(id.as_str()) {
            def.arguments.insert(name, value);
        }
    }

    pub(crate) fn add_also_known_as(&mut self, id: &ServiceId, alias: ServiceId) {
        if let Some(def) = self.get_mut(id.as_str()) {
            def.also_known_as.push(alias);
        }
    }

    pub fn add_contextual(&mut self, consumer: impl Into<String>, needs: impl Into<ServiceId>, concrete: impl Into<ServiceId>) {
        debug_assert!(!self.sealed, "DefinitionStore mutated after seal");
        self.contextual.add(ContextualRule {
            consumer: consumer.into(),
            needs: needs.into(),
            concrete: concrete.into(),
        });
    }

    pub fn add_extender(&mut self, abstract_id: impl Into<ServiceId>, f: ExtenderFn) {
        debug_assert!(!self.sealed, "DefinitionStore mutated after seal");
        let id: ServiceId = abstract_id.into();
        self.extenders.add(&id, f);
    }

    /// Specific extenders first, then wildcard extenders — both in
    /// registration order, per spec §5's ordering guarantees.
    pub(crate) fn extenders_for(&self, id: &ServiceId) -> Vec<ExtenderFn> {
        self.extenders.for_id(id)
    }

    /// Resolves a contextual override for `(consumerClass, needs)` following
    /// the spec's prioritized search: direct match, then wildcard patterns in
    /// registration order, then the consumer's declared supertypes (see
    /// `DESIGN.md` Open Question 2), memoized until the next contextual
    /// write.
    pub fn match_contextual(&self, consumer_class: &str, needs: &ServiceId) -> Option<ServiceId> {
        let cache_key = (consumer_class.to_string(), needs.clone());
        if let Some(hit) = self.contextual.cache.read().unwrap().get(&cache_key) {
            return hit.clone();
        }
        let result = self.match_contextual_uncached(consumer_class, needs);
        self.contextual
            .cache
            .write()
            .unwrap()
            .insert(cache_key, result.clone());
        result
    }

    fn match_contextual_uncached(&self, consumer_class: &str, needs: &ServiceId) -> Option<ServiceId> {
        if let Some(hit) = self
            .contextual
            .direct
            .get(&(consumer_class.to_string(), needs.clone()))
        {
            return Some(hit.clone());
        }
        for rule in &self.contextual.wildcard {
            if rule.needs == *needs && glob::matches(&rule.consumer, consumer_class) {
                return Some(rule.concrete.clone());
            }
        }
        // Walk declared supertypes/interfaces (also_known_as) of the consumer,
        // repeating the direct-then-wildcard search for each.
        if let Some(def) = self.get(consumer_class) {
            for alias in &def.also_known_as {
                if let Some(hit) = self
                    .contextual
                    .direct
                    .get(&(alias.as_str().to_string(), needs.clone()))
                {
                    return Some(hit.clone());
                }
                for rule in &self.contextual.wildcard {
                    if rule.needs == *needs && glob::matches(&rule.consumer, alias.as_str()) {
                        return Some(rule.concrete.clone());
                    }
                }
            }
        }
        None
    }

    /// Freezes the store: no further `add`/`add_contextual`/`add_extender`
    /// calls are permitted (enforced in debug builds via `debug_assert!`).
    /// Sorts the Vec half for cache-friendlier lookup, mirroring
    /// `ferrous-di`'s `Registry::finalize`.
    pub fn seal(&mut self) {
        self.small.sort_by(|a, b| a.0.cmp(&b.0));
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn transient_def(id: &str) -> ServiceDefinition {
        ServiceDefinition {
            id: ServiceId::new(id),
            concrete: Concrete::Instance(std::sync::Arc::new(42i32)),
            lifetime: Lifetime::Transient,
            tags: Vec::new(),
            arguments: Map::new(),
            also_known_as: Vec::new(),
        }
    }

    #[test]
    fn add_then_get_roundtrips() {
        let mut store = DefinitionStore::new();
        store.add(transient_def("App\\Logger"));
        assert!(store.has("App\\Logger"));
        assert!(!store.has("App\\Missing"));
    }

    #[test]
    fn contextual_direct_match_wins_over_wildcard() {
        let mut store = DefinitionStore::new();
        store.add_contextual("App\\Http\\*", "Logger", "FileLogger");
        store.add_contextual("App\\Http\\Controller", "Logger", "RequestLogger");
        let hit = store.match_contextual("App\\Http\\Controller", &ServiceId::new("Logger"));
        assert_eq!(hit, Some(ServiceId::new("RequestLogger")));
    }

    #[test]
    fn contextual_wildcard_matches_when_no_direct_rule() {
        let mut store = DefinitionStore::new();
        store.add_contextual("App\\Http\\*", "Logger", "FileLogger");
        let hit = store.match_contextual("App\\Http\\Other", &ServiceId::new("Logger"));
        assert_eq!(hit, Some(ServiceId::new("FileLogger")));
    }

    #[test]
    fn contextual_miss_returns_none() {
        let store = DefinitionStore::new();
        assert_eq!(store.match_contextual("Anything", &ServiceId::new("Logger")), None);
    }

    #[test]
    fn extenders_return_specific_before_wildcard() {
        let mut store = DefinitionStore::new();
        store.add_extender("*", std::sync::Arc::new(|v, _| v));
        store.add_extender("Logger", std::sync::Arc::new(|v, _| v));
        let fns = store.extenders_for(&ServiceId::new("Logger"));
        assert_eq!(fns.len(), 2);
    }
}

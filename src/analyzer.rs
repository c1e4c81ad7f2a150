//! `TypeAnalyzer` / `PrototypeFactory`: turns a registered class's
//! [`crate::prototype::Blueprint`] into a cached [`ServicePrototype`], with an
//! optional disk-backed cache so repeated process starts don't re-validate
//! every blueprint from scratch.
//!
//! Rust has no source-file checksum to compare at runtime (spec §6.2's
//! `classFileChecksum`), so the cache key's checksum is a content hash of the
//! blueprint's own declared shape instead — see `DESIGN.md`, Open Question 5.
//! The wire format itself follows the teacher's serde usage
//! (`graph_export.rs`) for structured, versioned on-disk data.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::prototype::ServicePrototype;

/// Bumped whenever the on-disk shape changes; a mismatch discards the whole
/// file and falls back to live analysis for every entry, per spec §6.2.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CachedPrototype {
    checksum: u64,
    prototype: ServicePrototype,
}

#[derive(Default, Serialize, Deserialize)]
struct CacheDocument {
    format_version: u32,
    entries: HashMap<String, CachedPrototype>,
}

/// Content hash of a prototype's declared shape — the stand-in for
/// `classFileChecksum` when there is no source file to hash at runtime.
fn content_hash(proto: &ServicePrototype) -> u64 {
    // ServicePrototype's fields are all plain data (no function pointers), so
    // a Debug-formatted hash is a simple, stable-enough fingerprint of shape.
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    format!("{proto:?}").hash(&mut hasher);
    hasher.finish()
}

/// Analyzes and caches [`ServicePrototype`]s. `cache_dir: None` means
/// memory-only caching (spec §6.3's `cacheDir: empty -> in-memory only`).
pub struct PrototypeFactory {
    memory: RwLock<HashMap<String, ServicePrototype>>,
    cache_dir: Option<PathBuf>,
}

impl PrototypeFactory {
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
            cache_dir,
        }
    }

    fn cache_file(&self) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|d| d.join("prototypes.json"))
    }

    fn load_disk_cache(&self) -> CacheDocument {
        let Some(path) = self.cache_file() else {
            return CacheDocument::default();
        };
        match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<CacheDocument>(&bytes) {
                Ok(doc) if doc.format_version == FORMAT_VERSION => doc,
                _ => CacheDocument::default(),
            },
            Err(_) => CacheDocument::default(),
        }
    }

    fn save_disk_cache(&self, doc: &CacheDocument) {
        let Some(path) = self.cache_file() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(bytes) = serde_json::to_vec(doc) {
            // Best-effort: a failed cache write is logged (via `tracing`) and
            // otherwise ignored, per spec §5's resource model.
            if std::fs::write(&path, bytes).is_err() {
                tracing::debug!(path = %path.display(), "failed to persist prototype cache");
            }
        }
    }

    /// Returns the analyzed prototype for `class_name`, computing it via
    /// `discover` (a type's `Blueprint::blueprint`, or an ad hoc
    /// `describe`d closure) on a cache miss, and validating it
    /// (`BadlyConfiguredService`) before it is ever cached or returned.
    pub fn analyze(
        &self,
        class_name: &str,
        discover: &(dyn Fn() -> ServicePrototype + Send + Sync),
    ) -> crate::error::DiResult<ServicePrototype> {
        if let Some(hit) = self.memory.read().unwrap().get(class_name) {
            return Ok(hit.clone());
        }

        let fresh = discover();
        fresh.validate()?;
        let checksum = content_hash(&fresh);

        let result = if self.cache_dir.is_some() {
            let mut doc = self.load_disk_cache();
            let cached = doc
                .entries
                .get(class_name)
                .filter(|c| c.checksum == checksum)
                .map(|c| c.prototype.clone());
            match cached {
                // Checksum matches: the persisted prototype is authoritative,
                // per spec §4.2 step 2 — return it instead of the freshly
                // discovered copy.
                Some(persisted) => persisted,
                None => {
                    doc.entries.insert(
                        class_name.to_string(),
                        CachedPrototype {
                            checksum,
                            prototype: fresh.clone(),
                        },
                    );
                    doc.format_version = FORMAT_VERSION;
                    self.save_disk_cache(&doc);
                    fresh
                }
            }
        } else {
            fresh
        };

        self.memory
            .write()
            .unwrap()
            .insert(class_name.to_string(), result.clone());
        Ok(result)
    }

    /// Invalidates every cached prototype, in memory and (if configured) on
    /// disk.
    pub fn clear(&self) {
        self.memory.write().unwrap().clear();
        if let Some(path) = self.cache_file() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prototype::{LifecycleFlags, ParameterPrototype};

    fn sample() -> ServicePrototype {
        ServicePrototype {
            class: "Widget".into(),
            is_instantiable: true,
            constructor: vec![ParameterPrototype::defaulted("size")],
            injected_properties: Vec::new(),
            injected_methods: Vec::new(),
            lifecycle: LifecycleFlags::default(),
        }
    }

    #[test]
    fn analyze_caches_in_memory() {
        let factory = PrototypeFactory::new(None);
        let first = factory.analyze("Widget", &sample).unwrap();
        let second = factory.analyze("Widget", &sample).unwrap();
        assert_eq!(first.class, second.class);
    }

    #[test]
    fn analyze_persists_and_reloads_from_disk() {
        let dir = std::env::temp_dir().join(format!("dicontainer-test-{}", std::process::id()));
        let factory = PrototypeFactory::new(Some(dir.clone()));
        factory.analyze("Widget", &sample).unwrap();

        let reloaded = PrototypeFactory::new(Some(dir.clone()));
        let proto = reloaded.analyze("Widget", &sample).unwrap();
        assert_eq!(proto.class, "Widget");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn clear_invalidates_memory_cache() {
        let factory = PrototypeFactory::new(None);
        factory.analyze("Widget", &sample).unwrap();
        factory.clear();
        assert!(factory.memory.read().unwrap().is_empty());
    }
}

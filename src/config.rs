//! Container configuration surface.
//!
//! The teacher's `ConfigProvider` (`examples/s1ntropy-ferrous-di/src/config.rs`) loads a
//! rich `ContainerConfig{performance, monitoring, service_discovery}` shape built for a
//! production service mesh. This container's configuration surface is the smaller,
//! explicit-field shape the spec names (§6.3): a `ContainerConfig` with exactly the
//! recognized options, loadable from the same kind of `ConfigSource` chain (env vars,
//! then JSON) — see `DESIGN.md`, Open Question 1.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::error::{DiError, DiResult};

/// Default for `maxResolutionDepth` when not otherwise configured.
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 50;

/// The recognized container configuration options (spec §6.3).
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Filesystem path for the prototype cache. `None` means in-memory only.
    pub cache_dir: Option<PathBuf>,
    /// Enables verbose tracing of the resolution pipeline.
    pub debug: bool,
    /// Enables [`crate::policy::StrictRule`] in the policy guard.
    pub strict: bool,
    /// Resolution depth cap; exceeding it fails with `DepthExceeded`.
    pub max_resolution_depth: usize,
    /// Namespace prefixes for [`crate::policy::AllowlistRule`]; empty disables it.
    pub allowed_namespaces: Vec<String>,
    /// On seal, pre-analyze every registered class instead of lazily on first use.
    pub compile: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            debug: false,
            strict: false,
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
            allowed_namespaces: Vec::new(),
            compile: false,
        }
    }
}

impl ContainerConfig {
    /// Builds a `ContainerConfig` by reading each recognized key from `sources` in
    /// priority order (first source wins), falling back to [`ContainerConfig::default`]
    /// for anything unset.
    pub fn load(sources: &[Box<dyn ConfigSource>]) -> Self {
        let mut config = Self::default();
        if let Some(v) = first(sources, "cache_dir") {
            config.cache_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = first(sources, "debug") {
            config.debug = parse_bool(&v);
        }
        if let Some(v) = first(sources, "strict") {
            config.strict = parse_bool(&v);
        }
        if let Some(v) = first(sources, "max_resolution_depth") {
            if let Ok(n) = v.parse() {
                config.max_resolution_depth = n;
            }
        }
        if let Some(v) = first(sources, "allowed_namespaces") {
            config.allowed_namespaces = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Some(v) = first(sources, "compile") {
            config.compile = parse_bool(&v);
        }
        config
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn first(sources: &[Box<dyn ConfigSource>], key: &str) -> Option<String> {
    sources.iter().find_map(|s| s.get(key))
}

/// A source of raw configuration values, consulted in priority order.
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads `DICONTAINER_<KEY>` (uppercased) environment variables, optionally under an
/// additional caller-chosen prefix.
#[derive(Debug, Default)]
pub struct EnvConfigSource {
    prefix: Option<String>,
}

impl EnvConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()) }
    }

    fn env_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key.to_uppercase()),
            None => format!("DICONTAINER_{}", key.to_uppercase()),
        }
    }
}

impl ConfigSource for EnvConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(self.env_key(key)).ok()
    }
}

/// Reads values from a flat JSON object on disk, parsed once and cached in memory.
#[cfg(feature = "config")]
pub struct JsonConfigSource {
    values: HashMap<String, String>,
}

#[cfg(feature = "config")]
impl JsonConfigSource {
    pub fn load(path: impl AsRef<std::path::Path>) -> DiResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DiError::ContainerException(format!("reading config file: {e}")))?;
        let raw: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| DiError::ContainerException(format!("parsing config file: {e}")))?;
        let object = raw
            .as_object()
            .ok_or_else(|| DiError::ContainerException("config file is not a JSON object".to_string()))?;
        let values = object
            .iter()
            .map(|(k, v)| (k.clone(), json_value_to_string(v)))
            .collect();
        Ok(Self { values })
    }
}

#[cfg(feature = "config")]
fn json_value_to_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(feature = "config")]
impl ConfigSource for JsonConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

//! Service identifier types for the dependency injection container.
//!
//! Unlike `ferrous-di`'s `Key`, which discriminates on a Rust `TypeId`, this
//! container is addressed by caller-chosen abstract names (a class name, an
//! interface name, an alias). `ServiceId` wraps that string so equality,
//! hashing and ordering — the hot path of every resolution — have one place
//! to live.

use std::borrow::Borrow;
use std::fmt;

/// An abstract service identifier, e.g. `"App\\Contracts\\Logger"` or `"cache"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(s: &str) -> Self {
        ServiceId(s.to_owned())
    }
}

impl From<String> for ServiceId {
    fn from(s: String) -> Self {
        ServiceId(s)
    }
}

impl From<&ServiceId> for ServiceId {
    fn from(s: &ServiceId) -> Self {
        s.clone()
    }
}

impl Borrow<str> for ServiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

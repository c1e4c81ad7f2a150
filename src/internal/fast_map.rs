//! A `HashMap` alias that swaps its hasher to `ahash` under the `ahash`
//! feature — the definition store's tag index, large-overflow map, and
//! contextual match cache are all keyed by `ServiceId`/string pairs on
//! every resolution's hot path, the same kind of lookup `ahash` is built to
//! speed up over the default `SipHash` (DoS-resistant but slower; not a
//! concern for a process-local container's own ids).

use std::collections::HashMap;

#[cfg(feature = "ahash")]
pub(crate) type FastMap<K, V> = HashMap<K, V, ahash::RandomState>;

#[cfg(not(feature = "ahash"))]
pub(crate) type FastMap<K, V> = HashMap<K, V>;

pub(crate) fn new<K, V>() -> FastMap<K, V> {
    FastMap::default()
}

//! `ResolutionContext`: the per-call record the engine threads through a
//! resolution tree.
//!
//! `ferrous-di` detects circular dependencies with a thread-local stack and
//! `panic::catch_unwind` (see the deleted `internal/circular.rs`). This
//! crate instead walks `ResolutionContext::parent` directly — the spec
//! already models `parent` and `depth` as first-class fields (§3), so cycle
//! detection falls out of that data model as a plain `Result`-returning walk
//! instead of an unwind-based side channel. See `DESIGN.md`, Open Question 3.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::id::ServiceId;
use crate::prototype::AnyArc;

/// One stage-transition trace entry, recorded by every engine stage.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub stage: &'static str,
    pub service_id: ServiceId,
}

/// A node in the resolution call chain. Child contexts are created for every
/// constructor/property/method parameter the engine recurses into; the chain
/// is discarded once the outermost `Get`/`Make` returns.
#[derive(Clone)]
pub struct ResolutionContext {
    pub service_id: ServiceId,
    pub parent: Option<Arc<ResolutionContext>>,
    pub overrides: HashMap<String, AnyArc>,
    /// The class currently being built that this resolution is injected
    /// into, used for contextual-rule matching. `None` at the root.
    pub consumer: Option<&'static str>,
    pub depth: usize,
    pub trace: Vec<TraceEntry>,
}

impl ResolutionContext {
    pub fn root(service_id: ServiceId) -> Self {
        Self {
            service_id,
            parent: None,
            overrides: HashMap::new(),
            consumer: None,
            depth: 0,
            trace: Vec::new(),
        }
    }

    /// Builds a child context for a dependency of `self`, checking for a
    /// cycle (this id already appears on the parent chain) and for
    /// `maxResolutionDepth` before returning it.
    pub fn child(
        parent: Arc<ResolutionContext>,
        service_id: ServiceId,
        consumer: Option<&'static str>,
        max_depth: usize,
    ) -> DiResult<Self> {
        let depth = parent.depth + 1;
        if depth > max_depth {
            return Err(DiError::DepthExceeded(max_depth));
        }
        if let Some(path) = Self::cycle_path(&parent, &service_id) {
            return Err(DiError::CircularDependency(path));
        }
        Ok(Self {
            service_id,
            parent: Some(parent),
            overrides: HashMap::new(),
            consumer,
            depth,
            trace: Vec::new(),
        })
    }

    /// Walks from `from` up through its ancestors; if `candidate` already
    /// appears anywhere on that chain, returns the full cycle path
    /// (oldest-ancestor-first, with `candidate` repeated at both ends).
    fn cycle_path(from: &Arc<ResolutionContext>, candidate: &ServiceId) -> Option<Vec<String>> {
        let mut chain = vec![from.service_id.as_str().to_string()];
        let mut cursor = Some(from.clone());
        let mut found = from.service_id == *candidate;
        while let Some(node) = cursor {
            if let Some(p) = &node.parent {
                chain.push(p.service_id.as_str().to_string());
                if p.service_id == *candidate {
                    found = true;
                }
                cursor = Some(p.clone());
            } else {
                cursor = None;
            }
        }
        if !found {
            return None;
        }
        chain.reverse();
        chain.push(candidate.as_str().to_string());
        Some(chain)
    }

    pub fn record(&mut self, stage: &'static str) {
        self.trace.push(TraceEntry {
            stage,
            service_id: self.service_id.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_no_parent_and_zero_depth() {
        let ctx = ResolutionContext::root(ServiceId::new("A"));
        assert!(ctx.parent.is_none());
        assert_eq!(ctx.depth, 0);
    }

    #[test]
    fn child_increments_depth() {
        let root = Arc::new(ResolutionContext::root(ServiceId::new("A")));
        let child = ResolutionContext::child(root, ServiceId::new("B"), Some("A"), 50).unwrap();
        assert_eq!(child.depth, 1);
    }

    #[test]
    fn detects_direct_cycle() {
        let root = Arc::new(ResolutionContext::root(ServiceId::new("A")));
        let b = Arc::new(ResolutionContext::child(root, ServiceId::new("B"), Some("A"), 50).unwrap());
        let err = ResolutionContext::child(b, ServiceId::new("A"), Some("B"), 50).unwrap_err();
        match err {
            DiError::CircularDependency(path) => {
                assert_eq!(path, vec!["A".to_string(), "B".to_string(), "A".to_string()]);
            }
            other => panic!("expected CircularDependency, got {other:?}"),
        }
    }

    #[test]
    fn depth_cap_is_enforced() {
        let mut ctx = Arc::new(ResolutionContext::root(ServiceId::new("A0")));
        for i in 1..=3 {
            ctx = Arc::new(ResolutionContext::child(ctx, ServiceId::new(format!("A{i}")), Some("x"), 3).unwrap());
        }
        let err = ResolutionContext::child(ctx, ServiceId::new("A4"), Some("x"), 3).unwrap_err();
        assert!(matches!(err, DiError::DepthExceeded(3)));
    }
}

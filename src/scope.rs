//! `ScopeRegistry`: a nested stack of ordered maps, searched innermost-out.
//!
//! Generalizes `ferrous-di`'s two-tier root-provider-plus-one-scope model
//! (`provider/scope.rs`'s `Scope`, `provider/mod.rs`'s root singleton map) to
//! an arbitrary-depth LIFO stack of frames, per spec §4.3. Frame 0 is the
//! permanent root (singletons); `begin_scope`/`end_scope` push/pop on top of
//! it. Disposal reuses the teacher's `DisposeBag` (`internal/dispose_bag.rs`)
//! one bag per frame, run in LIFO order when that frame is popped.

use crate::error::{DiError, DiResult};
use crate::id::ServiceId;
use crate::internal::fast_map::{self, FastMap};
use crate::internal::sync::Mutex;
use crate::internal::DisposeBag;
use crate::prototype::AnyArc;

struct ScopeFrame {
    instances: FastMap<ServiceId, AnyArc>,
    disposers: DisposeBag,
}

impl ScopeFrame {
    fn new() -> Self {
        Self {
            instances: fast_map::new(),
            disposers: DisposeBag::default(),
        }
    }
}

/// The LIFO stack of scope frames. There is always at least one frame (the
/// root, index 0); `begin_scope`/`end_scope` manage everything above it.
pub struct ScopeRegistry {
    frames: Mutex<Vec<ScopeFrame>>,
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self {
            frames: Mutex::new(vec![ScopeFrame::new()]),
        }
    }

    /// Searches from the innermost frame outward, returning the first hit.
    pub fn get(&self, id: &ServiceId) -> Option<AnyArc> {
        let frames = self.frames.lock();
        for frame in frames.iter().rev() {
            if let Some(v) = frame.instances.get(id) {
                return Some(v.clone());
            }
        }
        None
    }

    pub fn set_singleton(&self, id: ServiceId, instance: AnyArc) {
        let mut frames = self.frames.lock();
        frames[0].instances.insert(id, instance);
    }

    pub fn set_scoped(&self, id: ServiceId, instance: AnyArc) -> DiResult<()> {
        let mut frames = self.frames.lock();
        if frames.len() < 2 {
            return Err(DiError::NoActiveScope);
        }
        let top = frames.len() - 1;
        frames[top].instances.insert(id, instance);
        Ok(())
    }

    pub fn begin_scope(&self) {
        self.frames.lock().push(ScopeFrame::new());
    }

    /// Pops the innermost frame and returns its disposers (LIFO order is the
    /// caller's responsibility to run, since async disposal cannot happen
    /// while holding the frame lock). Fails if only the root frame remains.
    pub fn end_scope(&self) -> DiResult<DisposeBag> {
        let mut frames = self.frames.lock();
        if frames.len() < 2 {
            return Err(DiError::NoActiveScope);
        }
        Ok(frames.pop().unwrap().disposers)
    }

    pub fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        let mut frames = self.frames.lock();
        let top = frames.len() - 1;
        frames[top].disposers.push_sync(f);
    }

    /// Like [`ScopeRegistry::push_sync_disposer`], but always targets the
    /// permanent root frame regardless of how many scopes are currently
    /// live — used for a Singleton's own lifecycle disposer, which must run
    /// at container teardown even if it happened to be constructed while a
    /// nested scope was active.
    pub fn push_root_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        let mut frames = self.frames.lock();
        frames[0].disposers.push_sync(f);
    }

    pub fn push_async_disposer<Fut, F>(&self, f: F)
    where
        Fut: std::future::Future<Output = ()> + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
    {
        let mut frames = self.frames.lock();
        let top = frames.len() - 1;
        frames[top].disposers.push_async(f);
    }

    /// Resets to a single empty root frame, discarding every singleton and
    /// any live scopes. Used by `Container` teardown.
    pub fn clear(&self) -> DisposeBag {
        let mut frames = self.frames.lock();
        let mut combined = DisposeBag::default();
        while let Some(frame) = frames.pop() {
            combined.merge(frame.disposers);
        }
        frames.push(ScopeFrame::new());
        combined
    }

    pub fn depth(&self) -> usize {
        self.frames.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn val(n: i32) -> AnyArc {
        Arc::new(n)
    }

    #[test]
    fn singleton_visible_from_nested_scope() {
        let reg = ScopeRegistry::new();
        reg.set_singleton(ServiceId::new("A"), val(1));
        reg.begin_scope();
        assert!(reg.get(&ServiceId::new("A")).is_some());
    }

    #[test]
    fn scoped_isolated_per_frame() {
        let reg = ScopeRegistry::new();
        reg.begin_scope();
        reg.set_scoped(ServiceId::new("B"), val(1)).unwrap();
        assert!(reg.get(&ServiceId::new("B")).is_some());
        reg.end_scope().unwrap();
        assert!(reg.get(&ServiceId::new("B")).is_none());
    }

    #[test]
    fn set_scoped_without_active_scope_fails() {
        let reg = ScopeRegistry::new();
        assert!(matches!(reg.set_scoped(ServiceId::new("B"), val(1)), Err(DiError::NoActiveScope)));
    }

    #[test]
    fn end_scope_without_active_scope_fails() {
        let reg = ScopeRegistry::new();
        assert!(matches!(reg.end_scope(), Err(DiError::NoActiveScope)));
    }

    #[test]
    fn inner_frame_shadows_outer() {
        let reg = ScopeRegistry::new();
        reg.begin_scope();
        reg.set_scoped(ServiceId::new("C"), val(1)).unwrap();
        reg.begin_scope();
        reg.set_scoped(ServiceId::new("C"), val(2)).unwrap();
        let v = reg.get(&ServiceId::new("C")).unwrap();
        assert_eq!(*v.downcast_ref::<i32>().unwrap(), 2);
        reg.end_scope().unwrap();
        let v = reg.get(&ServiceId::new("C")).unwrap();
        assert_eq!(*v.downcast_ref::<i32>().unwrap(), 1);
    }
}

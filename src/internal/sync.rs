//! A `Mutex` shim so the hot locks in `engine.rs`/`scope.rs` can swap to
//! `parking_lot` under the `parking-lot` feature without two call-site
//! variants: `parking_lot::Mutex::lock` never returns a `Result`, while
//! `std::sync::Mutex::lock` does, so this wraps the std version to the same
//! non-poisoning, infallible interface (a poisoned std mutex just recovers its
//! inner value — this container has no invariant that a panicking resolution
//! should wedge every future one).

#[cfg(feature = "parking-lot")]
pub(crate) use parking_lot::{Mutex, MutexGuard};

#[cfg(not(feature = "parking-lot"))]
pub(crate) use self::std_backed::{Mutex, MutexGuard};

#[cfg(not(feature = "parking-lot"))]
mod std_backed {
    use std::sync::{Mutex as StdMutex, MutexGuard as StdMutexGuard};

    pub(crate) struct Mutex<T>(StdMutex<T>);

    pub(crate) type MutexGuard<'a, T> = StdMutexGuard<'a, T>;

    impl<T> Mutex<T> {
        pub(crate) fn new(value: T) -> Self {
            Self(StdMutex::new(value))
        }

        pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
            self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }
    }
}

//! Copy-on-write snapshot publication for the shared registries.
//!
//! Readers take the current snapshot once per operation and work on that
//! `Arc` without further locking. Writers are serialized by a separate mutex,
//! build a complete replacement off to the side, and only then swap the
//! pointer, so a reader never observes a half-applied registration and never
//! waits for one to finish building.

use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex, PoisonError};

pub(crate) struct SnapshotCell<T> {
    current: ArcSwap<T>,
    writer: Mutex<()>,
}

impl<T> SnapshotCell<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            current: ArcSwap::from_pointee(value),
            writer: Mutex::new(()),
        }
    }

    /// Current snapshot. Lock-free; never waits on a writer.
    pub(crate) fn load(&self) -> Arc<T> {
        self.current.load_full()
    }
}

impl<T: Clone> SnapshotCell<T> {
    /// Apply `change` to a private copy of the current snapshot and publish
    /// it. Nothing is published when `change` fails.
    pub(crate) fn update<R, E>(&self, change: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = T::clone(&self.load());
        let result = change(&mut next)?;
        self.current.store(Arc::new(next));
        Ok(result)
    }

    /// Replace the snapshot with `value`, returning the previous one.
    pub(crate) fn replace(&self, value: T) -> Arc<T> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.current.swap(Arc::new(value))
    }
}

impl<T: Default> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

use crate::{IntoAnyLoader, ResourceLoader};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Reusable loader instances of one concrete type. Meant to be embedded in a
/// [`ResourceManager`](crate::ResourceManager) implementation, whose
/// `release_resource_loader_instance` forwards to [`release`](Self::release).
pub struct LoaderPool<L: ResourceLoader> {
    available: Mutex<Vec<Box<L>>>,
    created: AtomicUsize,
    outstanding: AtomicUsize,
}

impl<L: ResourceLoader> LoaderPool<L> {
    pub fn new() -> Self {
        LoaderPool {
            available: Mutex::new(Vec::default()),
            created: AtomicUsize::new(0),
            outstanding: AtomicUsize::new(0),
        }
    }

    fn lock_available(&self) -> MutexGuard<'_, Vec<Box<L>>> {
        // The vec is always in a valid state, a panic elsewhere can't corrupt it
        self.available
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands out a pooled instance if there is one, otherwise creates one with `create`. Reused
    /// instances keep whatever state they had when released, callers reset them.
    pub fn acquire_with<F: FnOnce() -> L>(
        &self,
        create: F,
    ) -> Box<L> {
        let pooled = self.lock_available().pop();
        let loader = match pooled {
            Some(loader) => loader,
            None => {
                self.created.fetch_add(1, Ordering::Relaxed);
                Box::new(create())
            }
        };

        self.outstanding.fetch_add(1, Ordering::AcqRel);
        loader
    }

    /// Returns an instance to the pool. Instances of some other loader type are logged and
    /// dropped.
    pub fn release(
        &self,
        loader: Box<dyn ResourceLoader>,
    ) where
        L: 'static,
    {
        match IntoAnyLoader::into_any(loader).downcast::<L>() {
            Ok(loader) => self.release_typed(loader),
            Err(_) => log::error!(
                "LoaderPool<{}> was handed a loader of a different type, dropping it",
                std::any::type_name::<L>()
            ),
        }
    }

    pub fn release_typed(
        &self,
        loader: Box<L>,
    ) {
        // An instance this pool never handed out still gets pooled, but must not wrap the count
        let decremented = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |outstanding| {
                outstanding.checked_sub(1)
            });
        if decremented.is_err() {
            log::warn!(
                "LoaderPool<{}> got back more instances than it handed out",
                std::any::type_name::<L>()
            );
        }
        self.lock_available().push(loader);
    }

    /// Instances sitting in the pool, ready to be reused
    pub fn available(&self) -> usize {
        self.lock_available().len()
    }

    /// Instances handed out and not yet released
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Total instances ever created by this pool
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl<L: ResourceLoader> Default for LoaderPool<L> {
    fn default() -> Self {
        LoaderPool::new()
    }
}

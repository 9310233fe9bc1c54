use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::Entity;

/// One entity kind's records, in the order the store returned or confirmed them.
///
/// Readers get snapshots. Writes are crate-internal so every change goes
/// through a confirmed mutation.
pub struct Collection<T> {
    items: RwLock<Vec<T>>,
    loading: AtomicBool,
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            loading: AtomicBool::new(true),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.read().clone()
    }

    pub fn get(&self, id: i64) -> Option<T> {
        self.read().iter().find(|item| item.id() == id).cloned()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.read().iter().any(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Borrow the records without cloning them.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.read())
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// End a fetch. Rows replace the contents when present; the loading flag
    /// clears either way.
    pub(crate) fn finish_loading(&self, rows: Option<Vec<T>>) {
        if let Some(rows) = rows {
            *self.write() = rows;
        }
        self.loading.store(false, Ordering::Release);
    }

    pub(crate) fn push(&self, item: T) {
        self.write().push(item);
    }

    /// Apply `f` to the record with `id`. Returns whether one was found.
    pub(crate) fn update(&self, id: i64, f: impl FnOnce(&mut T)) -> bool {
        match self.write().iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&self, id: i64) -> Option<T> {
        let mut items = self.write();
        let pos = items.iter().position(|item| item.id() == id)?;
        Some(items.remove(pos))
    }

    pub(crate) fn retain(&self, keep: impl FnMut(&T) -> bool) {
        self.write().retain(keep);
    }
}

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

/// Formatted snapshot of a program value, as printed by the `print` command.
pub type Value = serde_json::Value;

/// An indirect reference to a live value owned by the instrumented program.
///
/// The code generator constructs one slot per declared variable. Reading a
/// slot must observe the program's current value, not a copy taken at
/// declaration time; constants bypass slots entirely.
pub trait Slot: Send + Sync {
    fn current_value(&self) -> Value;
}

/// A shared cell the instrumented program routes a variable's reads and
/// writes through, so the debugger observes the latest write when it
/// dereferences the slot.
pub struct Watched<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Watched<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    pub fn set(&self, value: T) {
        *self.write() = value;
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.write())
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.read().clone()
    }

    // Inspection must still work after a panicking writer poisoned the lock;
    // it reads whatever value that writer left behind.
    fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Clone for Watched<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Serialize + Send + Sync> Slot for Watched<T> {
    fn current_value(&self) -> Value {
        to_value_or_die(&*self.read())
    }
}

/// Slot backed by a closure, for values the generator cannot wrap in a
/// [`Watched`] cell.
pub struct SlotFn<F>(pub F);

impl<F> Slot for SlotFn<F>
where
    F: Fn() -> Value + Send + Sync,
{
    fn current_value(&self) -> Value {
        (self.0)()
    }
}

/// A value that cannot be serialized indicates a bug in the code generator,
/// not a runtime condition, so it aborts rather than recovers.
pub(crate) fn to_value_or_die<T: Serialize>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(v) => v,
        Err(e) => panic!("programming error: declared value cannot be formatted: {}", e),
    }
}

use std::sync::{Mutex, PoisonError};

/// Shared data that threads of a region may only touch one at a time.
///
/// The equivalent of wrapping every access in a named critical section: [`enter()`][Self::enter]
/// blocks until no other thread is inside, then hands out exclusive access for the duration
/// of the closure.
#[derive(Debug, Default)]
pub struct CriticalSection<T> {
    value: Mutex<T>,
}

impl<T> CriticalSection<T> {
    /// Creates a critical section guarding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    /// Runs `f` with exclusive access to the guarded value.
    pub fn enter<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        // A panic inside another thread's critical section is propagated by the region join,
        // the value itself is still usable for whoever gets here first.
        let mut guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Consumes the critical section, returning the guarded value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

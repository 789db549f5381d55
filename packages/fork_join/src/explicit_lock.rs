use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::{hint, thread};

// Busy-wait this many times before yielding the processor to another thread.
const SPINS_BEFORE_YIELD: u32 = 64;

/// A lock that is acquired and released by explicit calls, guarding a value.
///
/// [`set()`][Self::set] spins briefly and then yields until the lock is free. The returned
/// guard releases the lock via [`ExplicitLockGuard::unset()`] or when dropped.
#[derive(Debug, Default)]
pub struct ExplicitLock<T> {
    locked: AtomicBool,
    value: UnsafeCell<T>,
}

// SAFETY: The value is only ever reachable through a guard and at most one guard exists at a
// time, so sharing the lock between threads only ever moves the value between threads.
unsafe impl<T: Send> Sync for ExplicitLock<T> {}

impl<T> ExplicitLock<T> {
    /// Creates an unlocked lock guarding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock, waiting until no other thread holds it.
    pub fn set(&self) -> ExplicitLockGuard<'_, T> {
        let mut spins = 0_u32;

        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            if spins < SPINS_BEFORE_YIELD {
                spins = spins.saturating_add(1);
                hint::spin_loop();
            } else {
                thread::yield_now();
            }
        }

        ExplicitLockGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Whether some thread currently holds the lock.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Consumes the lock, returning the guarded value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

/// Exclusive access to the value of an [`ExplicitLock`], held until released.
#[derive(Debug)]
pub struct ExplicitLockGuard<'a, T> {
    lock: &'a ExplicitLock<T>,

    // Released on the thread that acquired it.
    _not_send: PhantomData<*const ()>,
}

impl<T> ExplicitLockGuard<'_, T> {
    /// Releases the lock.
    pub fn unset(self) {
        drop(self);
    }
}

impl<T> Deref for ExplicitLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: The guard exists only while `locked` is held by us, so nobody else can
        // access the value.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for ExplicitLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: See `deref()`. `&mut self` guarantees this is the only borrow via the guard.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for ExplicitLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(ExplicitLock<i64>: Send, Sync);
    assert_not_impl_any!(ExplicitLockGuard<'static, i64>: Send, Sync);

    #[test]
    fn set_and_unset() {
        let lock = ExplicitLock::new(1);
        assert!(!lock.is_set());

        let mut guard = lock.set();
        assert!(lock.is_set());
        *guard += 1;
        guard.unset();

        assert!(!lock.is_set());
        assert_eq!(lock.into_inner(), 2);
    }

    #[test]
    fn concurrent_updates_are_serialized() {
        let lock = ExplicitLock::new(0_u64);

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        let mut guard = lock.set();
                        *guard += 1;
                        guard.unset();
                    }
                });
            }
        });

        assert_eq!(lock.into_inner(), 4000);
    }
}

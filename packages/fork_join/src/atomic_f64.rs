use std::sync::atomic::{AtomicU64, Ordering};

/// A 64-bit float that can be updated from many threads without a lock.
///
/// Stored as its bit pattern in an [`AtomicU64`], with read-modify-write operations
/// implemented as compare-and-swap loops.
#[derive(Debug, Default)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    /// Creates an atomic float with the given initial value.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    /// Loads the current value.
    #[must_use]
    pub fn load(&self, ordering: Ordering) -> f64 {
        f64::from_bits(self.bits.load(ordering))
    }

    /// Adds `value` to the current value, returning the previous value.
    pub fn fetch_add(&self, value: f64, ordering: Ordering) -> f64 {
        let mut current = self.bits.load(Ordering::Relaxed);

        loop {
            let updated = (f64::from_bits(current) + value).to_bits();

            match self
                .bits
                .compare_exchange_weak(current, updated, ordering, Ordering::Relaxed)
            {
                Ok(previous) => return f64::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }

    /// Consumes the atomic, returning the contained value.
    #[must_use]
    pub fn into_inner(self) -> f64 {
        f64::from_bits(self.bits.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(AtomicF64: Send, Sync);

    #[test]
    fn fetch_add_returns_previous() {
        let value = AtomicF64::new(1.5);

        let previous = value.fetch_add(2.0, Ordering::Relaxed);

        assert_eq!(previous.to_bits(), 1.5_f64.to_bits());
        assert_eq!(value.load(Ordering::Relaxed).to_bits(), 3.5_f64.to_bits());
    }

    #[test]
    fn concurrent_adds_of_exact_values_are_not_lost() {
        let total = AtomicF64::default();

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        total.fetch_add(0.5, Ordering::Relaxed);
                    }
                });
            }
        });

        // Every partial sum is a multiple of 0.5 well within f64 precision.
        assert_eq!(total.into_inner().to_bits(), 2000.0_f64.to_bits());
    }
}

use std::hint::black_box;
use std::time::{Duration, Instant};

/// The unit in which a kernel reports elapsed time.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "record streams only use these units")]
pub enum TimeUnit {
    /// Milliseconds.
    #[display("ms")]
    Milliseconds,

    /// Microseconds.
    #[display("us")]
    Microseconds,
}

impl TimeUnit {
    /// Expresses `duration` in this unit.
    #[must_use]
    pub fn convert(self, duration: Duration) -> f64 {
        match self {
            Self::Milliseconds => duration.as_secs_f64() * 1_000.0,
            Self::Microseconds => duration.as_secs_f64() * 1_000_000.0,
        }
    }
}

/// The outcome of executing one sweep point: how long it took and what it returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Measurement<T> {
    elapsed: Duration,
    value: T,
}

impl<T> Measurement<T> {
    /// Wall-clock time between the timestamps taken around the invocation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Elapsed time in the given unit.
    #[must_use]
    pub fn elapsed_in(&self, unit: TimeUnit) -> f64 {
        unit.convert(self.elapsed)
    }

    /// The value the measured callable returned.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Splits the measurement into the elapsed time and the returned value.
    #[must_use]
    pub fn into_parts(self) -> (Duration, T) {
        (self.elapsed, self.value)
    }
}

/// Executes `f` exactly once between two monotonic timestamps.
///
/// Nothing but the two `Instant::now()` calls and `f` itself runs inside the timed window.
/// The returned value is passed through [`black_box`] so the work cannot be optimized away.
#[cfg_attr(test, mutants::skip)] // Timing is not observable in a stable way.
pub fn measure<T>(f: impl FnOnce() -> T) -> Measurement<T> {
    let start = Instant::now();
    let value = black_box(f());
    let elapsed = start.elapsed();

    Measurement { elapsed, value }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::thread;

    use super::*;

    #[test]
    fn invokes_exactly_once_and_returns_value() {
        let calls = Cell::new(0);

        let measurement = measure(|| {
            calls.set(calls.get() + 1);
            42
        });

        assert_eq!(calls.get(), 1);
        assert_eq!(*measurement.value(), 42);
    }

    #[test]
    fn elapsed_covers_the_work() {
        let measurement = measure(|| thread::sleep(Duration::from_millis(5)));

        assert!(measurement.elapsed() >= Duration::from_millis(5));
        assert!(measurement.elapsed_in(TimeUnit::Milliseconds) >= 5.0);
    }

    #[test]
    fn unit_conversion() {
        let duration = Duration::from_micros(1500);

        assert!((TimeUnit::Milliseconds.convert(duration) - 1.5).abs() < 1e-9);
        assert!((TimeUnit::Microseconds.convert(duration) - 1500.0).abs() < 1e-6);
    }
}

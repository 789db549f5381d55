use std::ops::Range;

use fork_join::{ExecutionContext, Schedule, Sum};
use new_zealand::nz;

use crate::kernels::Variant;

/// Loop schedules compared on iterations of uneven cost.
///
/// Iteration `i` performs `i % 100` steps of busy work, except every tenth iteration which
/// returns a pseudo-random value in `[-1000, 1000]` derived from `i`. The kernel sums each
/// iteration's result modulo 100.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "variants mirror the measured method tags")]
pub enum CycleModes {
    /// Sequential loop.
    Single,

    /// Sum reduction with one contiguous block of iterations per thread.
    Static,

    /// Sum reduction with threads claiming eight iterations at a time.
    Dynamic,

    /// Sum reduction with threads claiming shrinking blocks of iterations.
    Guided,
}

impl CycleModes {
    /// Returns the sum over `0..iterations` of each iteration's result modulo 100.
    #[must_use]
    pub fn run(self, context: &ExecutionContext, iterations: usize) -> i64 {
        match self {
            Self::Single => partial(0, 0..iterations),
            Self::Static | Self::Dynamic | Self::Guided => {
                context.parallel_for_reduce(0..iterations, Sum, partial)
            }
        }
    }
}

impl Variant for CycleModes {
    const ALL: &'static [Self] = &[Self::Single, Self::Static, Self::Dynamic, Self::Guided];

    fn tag(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Guided => "guided",
        }
    }

    fn is_sequential(self) -> bool {
        matches!(self, Self::Single)
    }

    fn schedule(self) -> Schedule {
        match self {
            Self::Single | Self::Static => Schedule::default(),
            Self::Dynamic => Schedule::Dynamic { chunk: nz!(8) },
            Self::Guided => Schedule::Guided { min_chunk: nz!(1) },
        }
    }
}

fn partial(acc: i64, iterations: Range<usize>) -> i64 {
    iterations.fold(acc, |acc, index| {
        acc.wrapping_add(i64::from(iteration(index).wrapping_rem(100)))
    })
}

fn iteration(index: usize) -> i32 {
    if index.wrapping_rem(10) == 0 {
        return pseudo_random(index);
    }

    let steps = index.wrapping_rem(100);

    (0..steps)
        .fold(0_usize, |sum, step| sum.wrapping_add(step).wrapping_rem(100))
        .try_into()
        .expect("value below 100 always fits in i32")
}

// A deterministic stand-in for a random draw, so that every variant sees the same values.
fn pseudo_random(index: usize) -> i32 {
    let mixed = u64::try_from(index)
        .expect("usize fits in u64 on all supported targets")
        .wrapping_add(0x9E37_79B9_7F4A_7C15)
        .wrapping_mul(0xBF58_476D_1CE4_E5B9);
    let mixed = (mixed ^ (mixed >> 31)).wrapping_rem(2001);

    i32::try_from(mixed)
        .expect("value below 2001 always fits in i32")
        .wrapping_sub(1000)
}

#[cfg(not(miri))] // ProcessorSet is not supported under Miri.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudo_random_values_in_range() {
        for index in (0..10_000).step_by(10) {
            assert!((-1000..=1000).contains(&pseudo_random(index)));
        }
    }

    #[test]
    fn busy_iterations_follow_triangular_numbers() {
        // Sum of 0..4 is 6, no modulo wraparound yet.
        assert_eq!(iteration(4), 6);
        assert_eq!(iteration(1), 0);
    }

    #[test]
    fn all_schedules_agree_with_single() {
        let mut context = ExecutionContext::new(nz!(1));

        for iterations in [0, 1, 100, 10_000] {
            let expected = CycleModes::Single.run(&context, iterations);

            for count in [nz!(1), nz!(2), nz!(7)] {
                context.set_thread_count(count);

                for variant in CycleModes::ALL {
                    context.set_schedule(variant.schedule());
                    assert_eq!(variant.run(&context, iterations), expected, "{variant:?}");
                }
            }
        }
    }
}

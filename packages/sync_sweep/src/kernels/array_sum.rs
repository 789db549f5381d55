use std::sync::atomic::{AtomicI64, Ordering};

use fork_join::{CriticalSection, ExecutionContext, ExplicitLock, Sum, TeamMember};

use crate::kernels::Variant;

/// Synchronization strategies for summing an integer array in parallel.
///
/// Sums are `i64` with wrapping arithmetic, so all strategies return the same value for the
/// same input at any thread count.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "variants mirror the measured method tags")]
pub enum ArraySum {
    /// Parallel loop with a sum reduction clause.
    Builtin,

    /// Per-thread partial sums over contiguous chunks, merged inside a critical section.
    Critical,

    /// Per-thread partial sums over contiguous chunks, merged with an atomic add.
    Atomics,

    /// Per-thread partial sums over contiguous chunks, merged while holding an explicit lock.
    Locks,
}

impl ArraySum {
    /// Returns the sum of `values`.
    #[must_use]
    pub fn run(self, context: &ExecutionContext, values: &[i32]) -> i64 {
        match self {
            Self::Builtin => context.parallel_for_reduce(0..values.len(), Sum, |acc, chunk| {
                partial_sum(
                    acc,
                    values.get(chunk).expect("loop chunks are within the loop range"),
                )
            }),
            Self::Critical => {
                let total = CriticalSection::new(0_i64);

                context.parallel(|member| {
                    let partial = chunk_sum(member, values);
                    total.enter(|total| *total = total.wrapping_add(partial));
                });

                total.into_inner()
            }
            Self::Atomics => {
                let total = AtomicI64::new(0);

                context.parallel(|member| {
                    total.fetch_add(chunk_sum(member, values), Ordering::Relaxed);
                });

                total.into_inner()
            }
            Self::Locks => {
                let total = ExplicitLock::new(0_i64);

                context.parallel(|member| {
                    let partial = chunk_sum(member, values);

                    let mut guard = total.set();
                    *guard = guard.wrapping_add(partial);
                    guard.unset();
                });

                total.into_inner()
            }
        }
    }
}

impl Variant for ArraySum {
    const ALL: &'static [Self] = &[Self::Builtin, Self::Critical, Self::Atomics, Self::Locks];

    fn tag(self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::Critical => "critical",
            Self::Atomics => "atomics",
            Self::Locks => "locks",
        }
    }

    fn is_sequential(self) -> bool {
        false
    }
}

/// The sum of `values` computed on the calling thread, used as the reference result.
#[must_use]
pub fn sequential_sum(values: &[i32]) -> i64 {
    partial_sum(0, values)
}

fn partial_sum(acc: i64, values: &[i32]) -> i64 {
    values
        .iter()
        .fold(acc, |acc, value| acc.wrapping_add(i64::from(*value)))
}

fn chunk_sum(member: TeamMember, values: &[i32]) -> i64 {
    partial_sum(
        0,
        values
            .get(member.static_chunk(values.len()))
            .expect("static chunks are within the array"),
    )
}

#[cfg(not(miri))] // ProcessorSet is not supported under Miri.
#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;
    use crate::DataGenerator;

    #[test]
    fn all_strategies_yield_identical_sums() {
        let mut generator = DataGenerator::from_seed(17);
        let mut context = ExecutionContext::new(nz!(1));

        for len in [0, 1, 100, 10_007] {
            let values = generator.vector(len);
            let expected = sequential_sum(&values);

            for count in [nz!(1), nz!(2), nz!(3), nz!(16)] {
                context.set_thread_count(count);

                for variant in ArraySum::ALL {
                    assert_eq!(variant.run(&context, &values), expected, "{variant:?}");
                }
            }
        }
    }

    #[test]
    fn repeated_runs_are_stable() {
        let mut generator = DataGenerator::from_seed(19);
        let values = generator.vector(5000);
        let context = ExecutionContext::new(nz!(4));

        let first = ArraySum::ALL
            .iter()
            .map(|variant| variant.run(&context, &values))
            .collect::<Vec<_>>();

        for _ in 0..20 {
            let again = ArraySum::ALL
                .iter()
                .map(|variant| variant.run(&context, &values))
                .collect::<Vec<_>>();

            assert_eq!(again, first);
        }

        assert!(first.iter().all(|sum| *sum == sequential_sum(&values)));
    }

    #[test]
    fn no_sequential_variant() {
        assert!(ArraySum::ALL.iter().all(|variant| !variant.is_sequential()));
    }
}

use std::sync::atomic::{AtomicI32, Ordering};

use fork_join::{CriticalSection, ExecutionContext, Min};

use crate::kernels::Variant;

/// Result of searching for the minimum of an empty vector.
pub const NO_DATA: i32 = i32::MAX;

/// Ways to find the minimum of a vector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "variants mirror the measured method tags")]
pub enum MinFind {
    /// Linear scan with a running minimum.
    Single,

    /// Parallel loop that updates a shared minimum inside a critical section, entered only
    /// when a thread sees a smaller value than the current minimum.
    CriticalSection,

    /// Parallel loop with a min reduction clause.
    Reduction,
}

impl MinFind {
    /// Returns the smallest value, or [`NO_DATA`] if `values` is empty.
    #[must_use]
    pub fn run(self, context: &ExecutionContext, values: &[i32]) -> i32 {
        match self {
            Self::Single => values.iter().copied().fold(NO_DATA, i32::min),
            Self::CriticalSection => critical_section(context, values),
            Self::Reduction => context.parallel_for_reduce(0..values.len(), Min, |acc, chunk| {
                values
                    .get(chunk)
                    .expect("loop chunks are within the loop range")
                    .iter()
                    .copied()
                    .fold(acc, i32::min)
            }),
        }
    }
}

impl Variant for MinFind {
    const ALL: &'static [Self] = &[Self::Single, Self::CriticalSection, Self::Reduction];

    fn tag(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::CriticalSection => "critical_section",
            Self::Reduction => "reduction",
        }
    }

    fn is_sequential(self) -> bool {
        matches!(self, Self::Single)
    }
}

fn critical_section(context: &ExecutionContext, values: &[i32]) -> i32 {
    let minimum = CriticalSection::new(NO_DATA);

    // Copy of the minimum that threads compare against without entering the critical
    // section. Only written from inside the critical section.
    let published = AtomicI32::new(NO_DATA);

    context.parallel_for(0..values.len(), |chunk| {
        let chunk = values.get(chunk).expect("loop chunks are within the loop range");

        for &value in chunk {
            if value < published.load(Ordering::Relaxed) {
                minimum.enter(|minimum| {
                    if value < *minimum {
                        *minimum = value;
                        published.store(value, Ordering::Relaxed);
                    }
                });
            }
        }
    });

    minimum.into_inner()
}

#[cfg(not(miri))] // ProcessorSet is not supported under Miri.
#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;

    fn run_all(values: &[i32]) -> Vec<i32> {
        let mut results = Vec::new();
        let mut context = ExecutionContext::new(nz!(1));

        for count in [nz!(1), nz!(2), nz!(5)] {
            context.set_thread_count(count);

            for variant in MinFind::ALL {
                results.push(variant.run(&context, values));
            }
        }

        results
    }

    #[test]
    fn finds_minimum_with_duplicates() {
        let results = run_all(&[5, -3, 0, 17, -3]);

        assert!(results.iter().all(|min| *min == -3));
    }

    #[test]
    fn empty_input_is_no_data() {
        let results = run_all(&[]);

        assert!(results.iter().all(|min| *min == NO_DATA));
    }

    #[test]
    fn all_equal_and_sorted_inputs() {
        let ascending = (-50..50).collect::<Vec<_>>();
        let descending = ascending.iter().rev().copied().collect::<Vec<_>>();

        assert!(run_all(&[4; 33]).iter().all(|min| *min == 4));
        assert!(run_all(&ascending).iter().all(|min| *min == -50));
        assert!(run_all(&descending).iter().all(|min| *min == -50));
    }

    #[test]
    fn tags() {
        let tags = MinFind::ALL.iter().map(|variant| variant.tag()).collect::<Vec<_>>();

        assert_eq!(tags, ["single", "critical_section", "reduction"]);
        assert!(MinFind::Single.is_sequential());
        assert!(!MinFind::Reduction.is_sequential());
    }
}

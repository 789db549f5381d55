use std::ops::Range;
use std::sync::atomic::{AtomicI64, Ordering};

use fork_join::{CriticalSection, ExecutionContext, Sum};

use crate::KernelError;
use crate::kernels::Variant;

/// Ways to compute the dot product of two integer vectors.
///
/// Products are widened to `i64` and summed with wrapping arithmetic, so every variant returns
/// the same value for the same input regardless of how the work was divided.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "variants mirror the measured method tags")]
pub enum DotProduct {
    /// Sequential accumulation.
    Single,

    /// Per-thread partial sums over contiguous chunks, merged inside a critical section.
    CriticalSection,

    /// Per-thread partial sums over contiguous chunks, merged with an atomic add.
    Atomic,

    /// Parallel loop with a sum reduction clause.
    Reduction,
}

impl DotProduct {
    /// Returns the sum of elementwise products of `left` and `right`.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::LengthMismatch`] if the vectors differ in length.
    pub fn run(
        self,
        context: &ExecutionContext,
        left: &[i32],
        right: &[i32],
    ) -> Result<i64, KernelError> {
        if left.len() != right.len() {
            return Err(KernelError::LengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }

        Ok(match self {
            Self::Single => partial_dot(0, left, right),
            Self::CriticalSection => {
                let total = CriticalSection::new(0_i64);

                context.parallel(|member| {
                    let chunk = member.static_chunk(left.len());
                    let partial = partial_dot(0, slice(left, &chunk), slice(right, &chunk));

                    total.enter(|total| *total = total.wrapping_add(partial));
                });

                total.into_inner()
            }
            Self::Atomic => {
                let total = AtomicI64::new(0);

                context.parallel(|member| {
                    let chunk = member.static_chunk(left.len());
                    let partial = partial_dot(0, slice(left, &chunk), slice(right, &chunk));

                    // Atomic addition wraps on overflow, like the sequential accumulation.
                    total.fetch_add(partial, Ordering::Relaxed);
                });

                total.into_inner()
            }
            Self::Reduction => context.parallel_for_reduce(0..left.len(), Sum, |acc, chunk| {
                partial_dot(acc, slice(left, &chunk), slice(right, &chunk))
            }),
        })
    }
}

impl Variant for DotProduct {
    const ALL: &'static [Self] = &[
        Self::Single,
        Self::CriticalSection,
        Self::Atomic,
        Self::Reduction,
    ];

    fn tag(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::CriticalSection => "critical_section",
            Self::Atomic => "atomic",
            Self::Reduction => "reduction",
        }
    }

    fn is_sequential(self) -> bool {
        matches!(self, Self::Single)
    }
}

fn partial_dot(acc: i64, left: &[i32], right: &[i32]) -> i64 {
    left.iter().zip(right).fold(acc, |acc, (a, b)| {
        acc.wrapping_add(i64::from(*a).wrapping_mul(i64::from(*b)))
    })
}

fn slice<'a>(values: &'a [i32], chunk: &Range<usize>) -> &'a [i32] {
    values
        .get(chunk.clone())
        .expect("chunks are within the vector length")
}

#[cfg(not(miri))] // ProcessorSet is not supported under Miri.
#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn all_variants_agree() {
        let left = (0..1003).map(|v| (v * 37) % 211 - 105).collect::<Vec<i32>>();
        let right = (0..1003).map(|v| (v * 53) % 197 - 98).collect::<Vec<i32>>();

        let expected = left
            .iter()
            .zip(&right)
            .map(|(a, b)| i64::from(*a) * i64::from(*b))
            .sum::<i64>();

        let mut context = ExecutionContext::new(nz!(1));

        for count in [nz!(1), nz!(2), nz!(6)] {
            context.set_thread_count(count);

            for variant in DotProduct::ALL {
                assert_eq!(variant.run(&context, &left, &right).unwrap(), expected);
            }
        }
    }

    #[test]
    fn empty_vectors_yield_zero() {
        let context = ExecutionContext::new(nz!(3));

        for variant in DotProduct::ALL {
            assert_eq!(variant.run(&context, &[], &[]).unwrap(), 0);
        }
    }

    #[test]
    fn extreme_values_wrap_identically() {
        let left = vec![i32::MIN; 64];
        let right = vec![i32::MIN; 64];
        let context = ExecutionContext::new(nz!(4));

        let expected = DotProduct::Single.run(&context, &left, &right).unwrap();

        for variant in DotProduct::ALL {
            assert_eq!(variant.run(&context, &left, &right).unwrap(), expected);
        }
    }

    #[test]
    fn length_mismatch_is_fatal_error() {
        let context = ExecutionContext::new(nz!(2));

        for variant in DotProduct::ALL {
            let result = variant.run(&context, &[1, 2, 3], &[1, 2]);

            assert!(matches!(
                result,
                Err(KernelError::LengthMismatch { left: 3, right: 2 })
            ));
        }
    }
}

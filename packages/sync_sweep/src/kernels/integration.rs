use std::ops::Range;
use std::sync::atomic::Ordering;

use fork_join::{AtomicF64, CriticalSection, ExecutionContext, Sum};

use crate::kernels::Variant;

/// A definite integral of a continuous function over `[left, right]`.
#[derive(Clone, Copy, Debug)]
pub struct Integrand {
    function: fn(f64) -> f64,
    left: f64,
    right: f64,
}

impl Integrand {
    /// The integral of `function` over `[left, right]`.
    #[must_use]
    pub fn new(function: fn(f64) -> f64, left: f64, right: f64) -> Self {
        Self {
            function,
            left,
            right,
        }
    }

    /// Sum of the function values at the midpoints of rectangles `indexes`, out of `rects`
    /// equal-width rectangles covering the interval, starting from `acc`.
    #[expect(
        clippy::cast_precision_loss,
        reason = "rectangle indexes are far below 2^53, where the conversion is exact"
    )]
    fn midpoint_sum(&self, acc: f64, width: f64, indexes: Range<usize>) -> f64 {
        indexes.fold(acc, |acc, index| {
            acc + (self.function)(self.left + width / 2.0 + index as f64 * width)
        })
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "rectangle counts are far below 2^53, where the conversion is exact"
    )]
    fn width(&self, rects: usize) -> f64 {
        (self.right - self.left) / rects as f64
    }
}

/// Ways to integrate with the midpoint rule.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "variants mirror the measured method tags")]
pub enum Integration {
    /// Sequential accumulation over all rectangles.
    Single,

    /// Each thread sums a contiguous block of rectangles and merges its partial sum inside a
    /// critical section.
    CriticalSection,

    /// Each thread sums a contiguous block of rectangles and merges its partial sum with an
    /// atomic add.
    Atomic,

    /// Parallel loop with a sum reduction clause.
    Reduction,
}

impl Integration {
    /// Approximates the integral with `rects` rectangles, evaluating the function at each
    /// rectangle's midpoint. Zero rectangles yield zero.
    #[must_use]
    pub fn run(self, context: &ExecutionContext, integrand: &Integrand, rects: usize) -> f64 {
        if rects == 0 {
            return 0.0;
        }

        let width = integrand.width(rects);

        let sum = match self {
            Self::Single => integrand.midpoint_sum(0.0, width, 0..rects),
            Self::CriticalSection => {
                let total = CriticalSection::new(0.0);

                context.parallel(|member| {
                    let partial =
                        integrand.midpoint_sum(0.0, width, member.static_chunk(rects));

                    total.enter(|total| *total += partial);
                });

                total.into_inner()
            }
            Self::Atomic => {
                let total = AtomicF64::new(0.0);

                context.parallel(|member| {
                    let partial =
                        integrand.midpoint_sum(0.0, width, member.static_chunk(rects));

                    total.fetch_add(partial, Ordering::Relaxed);
                });

                total.into_inner()
            }
            Self::Reduction => context.parallel_for_reduce(0..rects, Sum, |acc, chunk| {
                integrand.midpoint_sum(acc, width, chunk)
            }),
        };

        sum * width
    }
}

impl Variant for Integration {
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

#[cfg(not(miri))] // ProcessorSet is not supported under Miri.
#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;

    fn exp_0_1() -> Integrand {
        Integrand::new(f64::exp, 0.0, 1.0)
    }

    #[test]
    fn approximates_known_integral() {
        let context = ExecutionContext::new(nz!(1));

        let result = Integration::Single.run(&context, &exp_0_1(), 10_000);

        assert!((result - (1.0_f64.exp() - 1.0)).abs() < 1e-8);
    }

    #[test]
    fn single_thread_variants_are_bit_identical() {
        let context = ExecutionContext::new(nz!(1));
        let expected = Integration::Single.run(&context, &exp_0_1(), 1001);

        for variant in Integration::ALL {
            let result = variant.run(&context, &exp_0_1(), 1001);
            assert_eq!(result.to_bits(), expected.to_bits(), "{variant:?}");
        }
    }

    #[test]
    fn parallel_variants_agree_within_rounding() {
        let mut context = ExecutionContext::new(nz!(1));
        let expected = Integration::Single.run(&context, &exp_0_1(), 9999);

        for count in [nz!(2), nz!(3), nz!(8)] {
            context.set_thread_count(count);

            for variant in Integration::ALL {
                let result = variant.run(&context, &exp_0_1(), 9999);
                assert!((result - expected).abs() < 1e-12, "{variant:?} at {count}");
            }
        }
    }

    #[test]
    fn zero_rectangles_yield_zero() {
        let context = ExecutionContext::new(nz!(2));

        for variant in Integration::ALL {
            assert_eq!(variant.run(&context, &exp_0_1(), 0).to_bits(), 0.0_f64.to_bits());
        }
    }

    #[test]
    fn fewer_rectangles_than_threads() {
        let context = ExecutionContext::new(nz!(8));
        let expected = Integration::Single.run(&context, &exp_0_1(), 3);

        for variant in Integration::ALL {
            let result = variant.run(&context, &exp_0_1(), 3);
            assert!((result - expected).abs() < 1e-12, "{variant:?}");
        }
    }
}

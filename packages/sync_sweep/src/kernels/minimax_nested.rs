use std::num::NonZero;

use fork_join::{ExecutionContext, Max, Min, Reduction, WorkShare};
use new_zealand::nz;

use crate::Matrix;
use crate::kernels::{Minimax, Variant};

/// Ways to find the largest row minimum of a matrix, comparing a flat parallel loop with
/// nested parallel loops over both rows and columns.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "variants mirror the measured method tags")]
pub enum MinimaxNested {
    /// Sequential scan.
    Single,

    /// Parallel loop over rows with a max reduction clause.
    Reduction,

    /// Parallel loop over rows with a max reduction, each row scanned by a nested parallel loop
    /// with a min reduction.
    Nested,
}

impl MinimaxNested {
    /// Returns the maximum over all rows of the row minimum.
    ///
    /// The nested variant divides the configured thread count between the two levels, see
    /// [`split_threads()`]. Whether the inner level really runs in parallel depends on the
    /// nesting setting of the context; the result is the same either way.
    #[must_use]
    pub fn run(self, context: &ExecutionContext, matrix: &Matrix) -> i32 {
        match self {
            Self::Single => Minimax::Single.run(context, matrix),
            Self::Reduction => Minimax::Reduction.run(context, matrix),
            Self::Nested => nested(context, matrix),
        }
    }
}

impl Variant for MinimaxNested {
    const ALL: &'static [Self] = &[Self::Single, Self::Reduction, Self::Nested];

    fn tag(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Reduction => "reduction",
            Self::Nested => "nested",
        }
    }

    fn is_sequential(self) -> bool {
        matches!(self, Self::Single)
    }

    fn nested(self) -> bool {
        matches!(self, Self::Nested)
    }

    fn prepare(self, context: &ExecutionContext) {
        if self == Self::Nested {
            let (outer, inner) = split_threads(context.thread_count());
            context.reserve_nested(outer, inner);
        }
    }
}

/// Divides a thread budget between an outer and an inner parallel region.
///
/// The outer region gets half of the threads, the inner region the rest. Neither gets fewer
/// than one.
#[must_use]
pub fn split_threads(thread_count: NonZero<usize>) -> (NonZero<usize>, NonZero<usize>) {
    let half = thread_count.get().checked_div(2).unwrap_or_default();
    let outer = NonZero::new(half).unwrap_or(nz!(1));
    let inner = NonZero::new(thread_count.get().saturating_sub(outer.get())).unwrap_or(nz!(1));

    (outer, inner)
}

fn nested(context: &ExecutionContext, matrix: &Matrix) -> i32 {
    let (outer, inner) = split_threads(context.thread_count());
    let rows = WorkShare::new(0..matrix.rows(), context.settings().schedule());

    let partials = context.parallel_with(outer, |member| {
        member.chunks(&rows).flatten().fold(i32::MIN, |acc, row| {
            let values = matrix.row(row);

            let row_min = member.nested_for_reduce(0..values.len(), inner, Min, |acc, cols| {
                values
                    .get(cols)
                    .expect("loop chunks are within the row")
                    .iter()
                    .copied()
                    .fold(acc, i32::min)
            });

            acc.max(row_min)
        })
    });

    Max.combine_all(partials.into_vec())
}

#[cfg(not(miri))] // ProcessorSet is not supported under Miri.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataGenerator;

    #[test]
    fn thread_split() {
        assert_eq!(split_threads(nz!(1)), (nz!(1), nz!(1)));
        assert_eq!(split_threads(nz!(2)), (nz!(1), nz!(1)));
        assert_eq!(split_threads(nz!(3)), (nz!(1), nz!(2)));
        assert_eq!(split_threads(nz!(8)), (nz!(4), nz!(4)));
        assert_eq!(split_threads(nz!(9)), (nz!(4), nz!(5)));
    }

    #[test]
    fn correct_with_nesting_disabled_and_enabled() {
        let mut generator = DataGenerator::from_seed(13);
        let matrix = generator.matrix(40, 37);
        let mut context = ExecutionContext::new(nz!(1));

        let expected = MinimaxNested::Single.run(&context, &matrix);

        for nested in [false, true] {
            context.set_nested(nested);

            for count in [nz!(1), nz!(2), nz!(5)] {
                context.set_thread_count(count);

                for variant in MinimaxNested::ALL {
                    assert_eq!(
                        variant.run(&context, &matrix),
                        expected,
                        "{variant:?} at {count} threads, nested = {nested}"
                    );
                }
            }
        }
    }

    #[test]
    fn row_major_3x3_yields_6() {
        let matrix = Matrix::from_fn(3, 3, |row, col| i32::try_from(row * 3 + col).unwrap());
        let mut context = ExecutionContext::new(nz!(4));
        context.set_nested(true);

        for variant in MinimaxNested::ALL {
            assert_eq!(variant.run(&context, &matrix), 6);
        }
    }

    #[test]
    fn prepared_nested_variant_is_correct() {
        let mut generator = DataGenerator::from_seed(17);
        let matrix = generator.matrix(64, 64);
        let mut context = ExecutionContext::new(nz!(6));

        let expected = MinimaxNested::Single.run(&context, &matrix);

        for variant in MinimaxNested::ALL {
            context.set_nested(variant.nested());
            variant.prepare(&context);

            for _ in 0..3 {
                assert_eq!(variant.run(&context, &matrix), expected, "{variant:?}");
            }
        }
    }

    #[test]
    fn only_nested_variant_enables_nesting() {
        let nesting = MinimaxNested::ALL
            .iter()
            .map(|variant| variant.nested())
            .collect::<Vec<_>>();

        assert_eq!(nesting, [false, false, true]);
    }
}

use std::sync::atomic::{AtomicI32, Ordering};

use fork_join::{CriticalSection, ExecutionContext, Max};

use crate::Matrix;
use crate::kernels::{Variant, row_min};

/// Ways to find the largest of the row minima of a matrix.
///
/// A matrix without rows yields `i32::MIN`; a row without columns has the minimum `i32::MAX`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "variants mirror the measured method tags")]
pub enum Minimax {
    /// Sequential scan over all rows.
    Single,

    /// Parallel loop over rows that updates a shared maximum inside a critical section,
    /// entered only when a thread sees a row minimum above the current maximum.
    CriticalSection,

    /// Parallel loop over rows with a max reduction clause.
    Reduction,
}

impl Minimax {
    /// Returns the maximum over all rows of the row minimum.
    #[must_use]
    pub fn run(self, context: &ExecutionContext, matrix: &Matrix) -> i32 {
        match self {
            Self::Single => (0..matrix.rows())
                .map(|row| row_min(matrix.row(row)))
                .fold(i32::MIN, i32::max),
            Self::CriticalSection => {
                let maximum = CriticalSection::new(i32::MIN);
                let published = AtomicI32::new(i32::MIN);

                context.parallel_for(0..matrix.rows(), |rows| {
                    for row in rows {
                        let candidate = row_min(matrix.row(row));

                        if candidate > published.load(Ordering::Relaxed) {
                            maximum.enter(|maximum| {
                                if candidate > *maximum {
                                    *maximum = candidate;
                                    published.store(candidate, Ordering::Relaxed);
                                }
                            });
                        }
                    }
                });

                maximum.into_inner()
            }
            Self::Reduction => context.parallel_for_reduce(0..matrix.rows(), Max, |acc, rows| {
                rows.map(|row| row_min(matrix.row(row))).fold(acc, i32::max)
            }),
        }
    }
}

impl Variant for Minimax {
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

#[cfg(not(miri))] // ProcessorSet is not supported under Miri.
#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;
    use crate::DataGenerator;

    fn sequential_3x3() -> Matrix {
        Matrix::from_fn(3, 3, |row, col| i32::try_from(row * 3 + col).unwrap())
    }

    #[test]
    fn row_major_3x3_yields_6() {
        let mut context = ExecutionContext::new(nz!(1));
        let matrix = sequential_3x3();

        for count in [nz!(1), nz!(2), nz!(4)] {
            context.set_thread_count(count);

            for variant in Minimax::ALL {
                assert_eq!(variant.run(&context, &matrix), 6, "{variant:?} at {count}");
            }
        }
    }

    #[test]
    fn random_matrices_agree_with_single() {
        let mut generator = DataGenerator::from_seed(11);
        let mut context = ExecutionContext::new(nz!(1));

        for (rows, cols) in [(1, 1), (7, 13), (50, 50), (3, 200)] {
            let matrix = generator.matrix(rows, cols);
            let expected = Minimax::Single.run(&context, &matrix);

            for count in [nz!(2), nz!(5)] {
                context.set_thread_count(count);

                for variant in Minimax::ALL {
                    assert_eq!(variant.run(&context, &matrix), expected);
                }
            }
        }
    }

    #[test]
    fn degenerate_shapes() {
        let context = ExecutionContext::new(nz!(3));

        for variant in Minimax::ALL {
            assert_eq!(variant.run(&context, &Matrix::new(0, 5)), i32::MIN);
            assert_eq!(variant.run(&context, &Matrix::new(4, 0)), i32::MAX);
        }
    }
}

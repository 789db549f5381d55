use fork_join::{ExecutionContext, Max, Schedule};
use new_zealand::nz;

use crate::Matrix;
use crate::kernels::{Variant, row_min};

/// Ways to find the largest row minimum of a lower-triangular matrix, where row `i` is only
/// scanned up to and including column `i`.
///
/// The ragged row widths make the per-row cost uneven, which is what the parallel variants
/// with different loop schedules are compared on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "variants mirror the measured method tags")]
pub enum MinimaxTriangular {
    /// Sequential scan.
    Single,

    /// Max reduction with rows dealt round-robin in chunks of two.
    Static,

    /// Max reduction with threads claiming two rows at a time.
    Dynamic,

    /// Max reduction with threads claiming shrinking blocks of at least two rows.
    Guided,
}

impl MinimaxTriangular {
    /// Returns the maximum over all rows of the minimum of the row's lower-triangular part.
    ///
    /// The parallel variants use whatever schedule the context is configured with; the
    /// sweep configures [`Variant::schedule()`] before each call.
    #[must_use]
    pub fn run(self, context: &ExecutionContext, matrix: &Matrix) -> i32 {
        match self {
            Self::Single => (0..matrix.rows())
                .map(|row| triangular_row_min(matrix, row))
                .fold(i32::MIN, i32::max),
            Self::Static | Self::Dynamic | Self::Guided => {
                context.parallel_for_reduce(0..matrix.rows(), Max, |acc, rows| {
                    rows.map(|row| triangular_row_min(matrix, row))
                        .fold(acc, i32::max)
                })
            }
        }
    }
}

impl Variant for MinimaxTriangular {
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
            Self::Single => Schedule::default(),
            Self::Static => Schedule::Static {
                chunk: Some(nz!(2)),
            },
            Self::Dynamic => Schedule::Dynamic { chunk: nz!(2) },
            Self::Guided => Schedule::Guided { min_chunk: nz!(2) },
        }
    }
}

fn triangular_row_min(matrix: &Matrix, row: usize) -> i32 {
    let values = matrix.row(row);
    let width = row.saturating_add(1).min(values.len());

    row_min(values.get(..width).expect("width is clamped to the row length"))
}

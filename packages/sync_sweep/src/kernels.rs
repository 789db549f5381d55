//! Numeric kernels, each implemented by several interchangeable variants that differ only in
//! how concurrent updates of the shared result are synchronized.
//!
//! For a fixed input every variant of a kernel returns the same value as its
//! [`Variant::is_sequential()`] variant (for floating point, up to the order in which partial
//! sums are combined).

mod array_sum;
mod cycle_modes;
mod dot_product;
mod integration;
mod min_find;
mod minimax;
mod minimax_nested;
mod minimax_triangular;

pub use array_sum::*;
pub use cycle_modes::*;
pub use dot_product::*;
pub use integration::*;
pub use min_find::*;
pub use minimax::*;
pub use minimax_nested::*;
pub use minimax_triangular::*;

use std::fmt::Debug;

use fork_join::{ExecutionContext, Schedule};

/// One member of a closed set of implementations of the same kernel.
pub trait Variant: Copy + Debug + Send + Sync + 'static {
    /// Every variant, in the order they are measured.
    const ALL: &'static [Self];

    /// Name written to the `method` column.
    fn tag(self) -> &'static str;

    /// Whether this is the single-threaded baseline that ignores the execution context.
    fn is_sequential(self) -> bool;

    /// Loop schedule to configure before invoking this variant.
    fn schedule(self) -> Schedule {
        Schedule::default()
    }

    /// Whether nested parallelism is to be enabled before invoking this variant.
    fn nested(self) -> bool {
        false
    }

    /// Untimed preparation of `context` after the region settings of this variant have been
    /// applied, so that the measured call does not pay for one-off setup.
    fn prepare(self, _context: &ExecutionContext) {}
}

/// Minimum of a row, `i32::MAX` for an empty row.
pub(crate) fn row_min(row: &[i32]) -> i32 {
    row.iter().copied().fold(i32::MAX, i32::min)
}

use std::io;

use thiserror::Error;

/// A kernel was given input that violates its preconditions.
///
/// Kernels never terminate the process themselves. The caller at the top of the program decides
/// what to do, which for benchmark runs means exiting with [`KernelError::EXIT_CODE`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KernelError {
    /// The operands of a dot product have different lengths.
    #[error("dot product operands differ in length: {left} != {right}")]
    LengthMismatch {
        /// Length of the left operand.
        left: usize,

        /// Length of the right operand.
        right: usize,
    },
}

impl KernelError {
    /// The process exit status reserved for malformed benchmark input.
    pub const EXIT_CODE: u8 = 133;

    /// The process exit status that this error maps to.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::LengthMismatch { .. } => Self::EXIT_CODE,
        }
    }
}

/// A sweep could not be completed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SweepError {
    /// A kernel rejected its input. This is fatal for the whole process.
    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// Writing a record or diagnostic failed.
    #[error("failed to write sweep output: {0}")]
    Io(#[from] io::Error),
}

impl SweepError {
    /// Exit status for a process that stops on this error.
    ///
    /// Rejected kernel input keeps the kernel's reserved status, anything else is a generic
    /// failure.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Kernel(e) => e.exit_code(),
            Self::Io(_) => 1,
        }
    }
}

/// A kernel selector did not name any known kernel.
#[derive(Debug, Error)]
#[non_exhaustive]
#[error("unknown kernel '{value}', expected a selector 1-8 or a kernel name")]
pub struct UnknownKernel {
    /// The selector that was given.
    pub value: String,
}

/// An element access fell outside the matrix.
#[derive(Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum MatrixError {
    /// The row or column index is beyond the matrix dimensions.
    #[error("element ({row}, {col}) is outside of a {rows}x{cols} matrix")]
    OutOfBounds {
        /// Requested row.
        row: usize,

        /// Requested column.
        col: usize,

        /// Number of rows in the matrix.
        rows: usize,

        /// Number of columns in the matrix.
        cols: usize,
    },
}

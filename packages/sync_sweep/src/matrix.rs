use crate::MatrixError;

/// A fixed-size integer matrix stored in row-major order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Box<[i32]>,
}

impl Matrix {
    /// Creates a `rows` x `cols` matrix filled with zeros.
    ///
    /// # Panics
    ///
    /// Panics if the element count does not fit in `usize`.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        let len = rows
            .checked_mul(cols)
            .expect("matrix element count must fit in usize");

        Self {
            rows,
            cols,
            data: vec![0; len].into_boxed_slice(),
        }
    }

    /// Creates a matrix whose element at (row, col) is `f(row, col)`.
    #[must_use]
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> i32) -> Self {
        let mut matrix = Self::new(rows, cols);

        for row in 0..rows {
            for col in 0..cols {
                matrix
                    .set(row, col, f(row, col))
                    .expect("indexes come from the matrix dimensions");
            }
        }

        matrix
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The element at (`row`, `col`), or `None` if outside the matrix.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<i32> {
        self.index_of(row, col)
            .and_then(|index| self.data.get(index).copied())
    }

    /// Overwrites the element at (`row`, `col`).
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::OutOfBounds`] if the position is outside the matrix.
    pub fn set(&mut self, row: usize, col: usize, value: i32) -> Result<(), MatrixError> {
        let element = self
            .index_of(row, col)
            .and_then(|index| self.data.get_mut(index))
            .ok_or(MatrixError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            })?;

        *element = value;
        Ok(())
    }

    /// The elements of one row.
    ///
    /// # Panics
    ///
    /// Panics if `row` is not less than [`rows()`][Self::rows].
    #[must_use]
    pub fn row(&self, row: usize) -> &[i32] {
        assert!(
            row < self.rows,
            "row {row} is outside of a matrix with {} rows",
            self.rows
        );

        // Cannot overflow: the product is at most the element count.
        let start = row.wrapping_mul(self.cols);

        self.data
            .get(start..start.wrapping_add(self.cols))
            .expect("row range is within the element buffer")
    }

    /// All elements in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.rows || col >= self.cols {
            return None;
        }

        row.checked_mul(self.cols)?.checked_add(col)
    }
}

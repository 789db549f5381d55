use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::Matrix;

/// Fills benchmark datasets with random values from one seeded generator.
///
/// Create one per process before the first dataset is filled. The seed is kept so that a run
/// can be reproduced.
#[derive(Debug)]
pub struct DataGenerator {
    seed: u64,
    rng: StdRng,
}

impl DataGenerator {
    /// A generator that produces the same datasets for the same seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A generator seeded from the thread-local entropy source.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::rng().random())
    }

    /// The seed this generator was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A vector of `len` values, each uniform in `[-len, len]`.
    pub fn vector(&mut self, len: usize) -> Vec<i32> {
        let bound = saturating_bound(len);

        (0..len)
            .map(|_| self.rng.random_range(-bound..=bound))
            .collect()
    }

    /// A `rows` x `cols` matrix with every element uniform in `[-n, n]` where `n` is the
    /// element count.
    pub fn matrix(&mut self, rows: usize, cols: usize) -> Matrix {
        let bound = saturating_bound(rows.saturating_mul(cols));

        Matrix::from_fn(rows, cols, |_, _| self.rng.random_range(-bound..=bound))
    }

    /// Like [`matrix()`][Self::matrix] but every element above the main diagonal is zero.
    pub fn lower_triangular_matrix(&mut self, rows: usize, cols: usize) -> Matrix {
        let bound = saturating_bound(rows.saturating_mul(cols));

        Matrix::from_fn(rows, cols, |row, col| {
            if col <= row {
                self.rng.random_range(-bound..=bound)
            } else {
                0
            }
        })
    }
}

fn saturating_bound(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

//! Value generators used to populate matrices and RHS vectors
//!
//! All generators are seeded, so a given seed always reproduces the same system.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DEFAULT_VALUE_BOUND;

/// Produces the initial value of a cell
///
/// For vectors the column argument is always 0.
pub trait ValueGenerator<T> {
    fn value(&mut self, row: usize, col: usize) -> T;
}

impl<T, F> ValueGenerator<T> for F
where
    F: FnMut(usize, usize) -> T,
{
    fn value(&mut self, row: usize, col: usize) -> T {
        self(row, col)
    }
}

/// Uniform pseudo-random integers in `[0, bound)`
pub struct UniformIntGenerator {
    rng: StdRng,
    bound: u32,
}

impl UniformIntGenerator {
    pub fn new(seed: u64) -> Self {
        Self::with_bound(seed, DEFAULT_VALUE_BOUND)
    }

    pub fn with_bound(seed: u64, bound: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            bound: bound.max(1),
        }
    }
}

impl<T: From<f32>> ValueGenerator<T> for UniformIntGenerator {
    fn value(&mut self, _row: usize, _col: usize) -> T {
        let v = self.rng.gen_range(0..self.bound);
        T::from(v as f32)
    }
}

/// Strictly row diagonally dominant values
///
/// Off-diagonal entries lie in `(-OFF_DIAGONAL, OFF_DIAGONAL)` and the diagonal
/// exceeds the largest possible off-diagonal row sum, so every elimination
/// stage sees a nonzero pivot.
pub struct DiagonallyDominantGenerator {
    rng: StdRng,
    cols: usize,
}

impl DiagonallyDominantGenerator {
    const OFF_DIAGONAL: i32 = 50;

    pub fn new(seed: u64, cols: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            cols,
        }
    }
}

impl<T: From<f32>> ValueGenerator<T> for DiagonallyDominantGenerator {
    fn value(&mut self, row: usize, col: usize) -> T {
        let off = Self::OFF_DIAGONAL;
        let v = if row == col {
            (off * self.cols as i32) as f32 + self.rng.gen_range(1..500) as f32
        } else {
            self.rng.gen_range(-off + 1..off) as f32
        };
        T::from(v)
    }
}

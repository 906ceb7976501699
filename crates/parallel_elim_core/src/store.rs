//! Matrix store: the coefficient matrix plus its right-hand side
//!
//! The store owns both halves of the augmented system `[A | b]` and hands out
//! per-stage partitions: a shared view of the pivot row and one exclusive
//! handle per active row. Partitioning is done with `split_at_mut`, so row
//! tasks never alias each other and no locks are involved.

use std::fmt;

use num_traits::Float;

use crate::error::{EliminationError, Result};
use crate::generate::ValueGenerator;
use crate::matrix::Matrix;

/// Augmented linear system `[A | b]`
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixStore<T> {
    matrix: Matrix<T>,
    rhs: Vec<T>,
}

/// Exclusive handle on one active row for the duration of a stage
pub struct ActiveRow<'a, T> {
    pub index: usize,
    pub cells: &'a mut [T],
    pub rhs: &'a mut T,
}

/// Ownership split of the store for stage `k`
///
/// Rows `<= k` are reachable only through `pivot_row`/`pivot_rhs` (read-only);
/// rows `> k` are handed out as disjoint [`ActiveRow`]s.
pub struct StagePartition<'a, T> {
    pub stage: usize,
    pub pivot_row: &'a [T],
    pub pivot_rhs: T,
    pub active: Vec<ActiveRow<'a, T>>,
}

impl<T: Float> MatrixStore<T> {
    /// Combine a matrix with its right-hand side
    pub fn new(matrix: Matrix<T>, rhs: Vec<T>) -> Result<Self> {
        if rhs.len() != matrix.rows() {
            return Err(EliminationError::Dimension {
                what: "rhs vector",
                expected: matrix.rows(),
                actual: rhs.len(),
            });
        }
        Ok(Self { matrix, rhs })
    }

    /// Zero-filled system with `rows` equations in `cols` unknowns
    pub fn create(rows: usize, cols: usize) -> Result<Self> {
        let matrix = Matrix::new(rows, cols)?;
        Ok(Self {
            matrix,
            rhs: vec![T::zero(); rows],
        })
    }

    /// The 3×3 worked example: A = [[2,1,1],[4,3,3],[8,7,9]], b = [5,10,24]
    pub fn example() -> Result<Self>
    where
        T: From<f32>,
    {
        let v = |x: f32| <T as From<f32>>::from(x);
        let matrix = Matrix::from_rows(&[
            vec![v(2.0), v(1.0), v(1.0)],
            vec![v(4.0), v(3.0), v(3.0)],
            vec![v(8.0), v(7.0), v(9.0)],
        ])?;
        Self::new(matrix, vec![v(5.0), v(10.0), v(24.0)])
    }

    pub fn dims(&self) -> (usize, usize) {
        self.matrix.dims()
    }

    pub fn rows(&self) -> usize {
        self.matrix.rows()
    }

    pub fn cols(&self) -> usize {
        self.matrix.cols()
    }

    pub fn matrix(&self) -> &Matrix<T> {
        &self.matrix
    }

    pub fn rhs(&self) -> &[T] {
        &self.rhs
    }

    pub fn read(&self, row: usize, col: usize) -> Result<T> {
        self.matrix.read(row, col)
    }

    pub fn write(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        self.matrix.write(row, col, value)
    }

    pub fn read_rhs(&self, row: usize) -> Result<T> {
        self.rhs
            .get(row)
            .copied()
            .ok_or_else(|| EliminationError::index("rhs row", row, self.rhs.len()))
    }

    pub fn write_rhs(&mut self, row: usize, value: T) -> Result<()> {
        let bound = self.rhs.len();
        let cell = self
            .rhs
            .get_mut(row)
            .ok_or_else(|| EliminationError::index("rhs row", row, bound))?;
        *cell = value;
        Ok(())
    }

    /// Populate the coefficient matrix
    pub fn fill<G: ValueGenerator<T> + ?Sized>(&mut self, generator: &mut G) {
        self.matrix.fill(generator);
    }

    /// Populate the right-hand side
    pub fn fill_vector<G: ValueGenerator<T> + ?Sized>(&mut self, generator: &mut G) {
        for (row, cell) in self.rhs.iter_mut().enumerate() {
            *cell = generator.value(row, 0);
        }
    }

    /// Split storage for stage `k`
    ///
    /// Fails with `IndexOutOfRange` when `k` is not a valid stage
    /// (`k > cols - 2`) or names a row that does not exist.
    pub fn partition(&mut self, k: usize) -> Result<StagePartition<'_, T>> {
        let (rows, cols) = self.matrix.dims();
        if k >= cols.saturating_sub(1) {
            return Err(EliminationError::index("stage", k, cols.saturating_sub(1)));
        }
        if k >= rows {
            return Err(EliminationError::index("row", k, rows));
        }

        let (head, tail) = self.matrix.as_mut_slice().split_at_mut((k + 1) * cols);
        let (rhs_head, rhs_tail) = self.rhs.split_at_mut(k + 1);

        let active = tail
            .chunks_mut(cols)
            .zip(rhs_tail.iter_mut())
            .enumerate()
            .map(|(n, (cells, rhs))| ActiveRow {
                index: k + 1 + n,
                cells,
                rhs,
            })
            .collect();

        Ok(StagePartition {
            stage: k,
            pivot_row: &head[k * cols..],
            pivot_rhs: rhs_head[k],
            active,
        })
    }

    /// Consume the store, returning the matrix and RHS
    pub fn into_parts(self) -> (Matrix<T>, Vec<T>) {
        (self.matrix, self.rhs)
    }
}

impl<T: Float + fmt::Display> fmt::Display for MatrixStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cols = self.matrix.cols();
        for (row, b) in self.matrix.as_slice().chunks(cols).zip(&self.rhs) {
            for value in row {
                write!(f, " {:>10.4}", value)?;
            }
            writeln!(f, " | {:>10.4}", b)?;
        }
        Ok(())
    }
}

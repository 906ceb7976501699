//! Dense matrix storage
//!
//! Row-major dense matrix with fixed dimensions and bounds-checked cell access.

use std::fmt;

use num_traits::Float;

use crate::error::{EliminationError, Result};
use crate::generate::ValueGenerator;

/// Dense matrix in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Float> Matrix<T> {
    /// Create a zero-filled matrix
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let len = cell_count::<T>(rows, cols)?;
        Ok(Self {
            data: vec![T::zero(); len],
            rows,
            cols,
        })
    }

    /// Create a matrix from a flat vector (row-major order)
    pub fn from_flat(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        let len = cell_count::<T>(rows, cols)?;
        if data.len() != len {
            return Err(EliminationError::Dimension {
                what: "matrix data",
                expected: len,
                actual: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Create a matrix from a list of equally sized rows
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(EliminationError::Dimension {
                    what: "matrix row",
                    expected: cols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::from_flat(data, rows.len(), cols)
    }

    /// Get matrix dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Read element at (row, col)
    pub fn read(&self, row: usize, col: usize) -> Result<T> {
        let idx = self.offset(row, col)?;
        Ok(self.data[idx])
    }

    /// Write element at (row, col)
    pub fn write(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let idx = self.offset(row, col)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Get a row as a slice
    pub fn row(&self, i: usize) -> Result<&[T]> {
        if i >= self.rows {
            return Err(EliminationError::index("row", i, self.rows));
        }
        let start = i * self.cols;
        Ok(&self.data[start..start + self.cols])
    }

    /// Get underlying data as slice
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Populate every cell in row-major order
    pub fn fill<G: ValueGenerator<T> + ?Sized>(&mut self, generator: &mut G) {
        let cols = self.cols;
        for (idx, cell) in self.data.iter_mut().enumerate() {
            *cell = generator.value(idx / cols, idx % cols);
        }
    }

    /// Largest magnitude below the pivot of every eliminated column
    ///
    /// Covers `A[i][j]` with `i > j` and `j <= cols - 2`; zero once forward
    /// elimination has run exactly.
    pub fn max_below_pivots(&self) -> T {
        let pivot_cols = self.cols.saturating_sub(1);
        let mut max = T::zero();
        for (i, row) in self.data.chunks(self.cols).enumerate() {
            for value in row.iter().take(i.min(pivot_cols)) {
                max = max.max(value.abs());
            }
        }
        max
    }

    fn offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows {
            return Err(EliminationError::index("row", row, self.rows));
        }
        if col >= self.cols {
            return Err(EliminationError::index("column", col, self.cols));
        }
        Ok(row * self.cols + col)
    }
}

/// Number of cells of a `rows` x `cols` matrix, rejecting empty or
/// unallocatable shapes
fn cell_count<T>(rows: usize, cols: usize) -> Result<usize> {
    if rows == 0 {
        return Err(EliminationError::Dimension {
            what: "matrix rows",
            expected: 1,
            actual: 0,
        });
    }
    if cols == 0 {
        return Err(EliminationError::Dimension {
            what: "matrix columns",
            expected: 1,
            actual: 0,
        });
    }
    let max_cells = isize::MAX as usize / std::mem::size_of::<T>().max(1);
    match rows.checked_mul(cols) {
        Some(len) if len <= max_cells => Ok(len),
        _ => Err(EliminationError::Dimension {
            what: "matrix rows",
            expected: max_cells / cols,
            actual: rows,
        }),
    }
}

impl<T: Float + fmt::Display> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks(self.cols) {
            for value in row {
                write!(f, " {:>10.4}", value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

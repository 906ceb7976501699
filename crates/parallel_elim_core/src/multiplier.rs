//! Multiplier phase of an elimination stage
//!
//! For stage `k` every active row `i > k` gets `m_i = A[i][k] / A[k][k]`.
//! The rows are independent, so the phase fans out over the rayon pool and
//! returns only once every multiplier has been materialized.

use num_traits::Float;
use rayon::prelude::*;

use crate::error::{EliminationError, Result};
use crate::store::MatrixStore;

/// Materialized multipliers of one stage, one entry per active row
#[derive(Debug, Clone, PartialEq)]
pub struct Multipliers<T> {
    stage: usize,
    // Ascending row order, starting at stage + 1
    entries: Vec<(usize, T)>,
}

impl<T: Copy> Multipliers<T> {
    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Multiplier for `row`, if one was produced at this stage
    pub fn get(&self, row: usize) -> Option<T> {
        let slot = row.checked_sub(self.stage + 1)?;
        match self.entries.get(slot) {
            Some(&(r, m)) if r == row => Some(m),
            _ => None,
        }
    }

    /// `(row, multiplier)` pairs in ascending row order
    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.entries.iter().copied()
    }

    #[cfg(test)]
    pub(crate) fn from_entries(stage: usize, entries: Vec<(usize, T)>) -> Self {
        Self { stage, entries }
    }
}

/// Computes the multipliers of a stage
pub struct MultiplierStage;

impl MultiplierStage {
    /// Compute every multiplier of stage `k`
    ///
    /// # Arguments
    /// * `store` - System in its state right after stage `k - 1`
    /// * `k` - Stage index, `0 <= k <= cols - 2`
    /// * `parallel` - Fan rows out over the rayon pool instead of running inline
    ///
    /// # Returns
    /// One multiplier per row in `k+1..rows`. A stage without active rows
    /// yields an empty set and never reads the pivot.
    pub fn compute<T>(store: &MatrixStore<T>, k: usize, parallel: bool) -> Result<Multipliers<T>>
    where
        T: Float + Send + Sync,
    {
        let (rows, cols) = store.dims();
        if k >= cols.saturating_sub(1) {
            return Err(EliminationError::index("stage", k, cols.saturating_sub(1)));
        }
        if k + 1 >= rows {
            return Ok(Multipliers {
                stage: k,
                entries: Vec::new(),
            });
        }

        let data = store.matrix().as_slice();
        let pivot = data[k * cols + k];
        if pivot.is_zero() {
            return Err(numeric(k, k, "zero pivot", pivot));
        }
        if !pivot.is_finite() {
            return Err(numeric(k, k, "non-finite pivot", pivot));
        }

        let multiplier = |i: usize| -> Result<(usize, T)> {
            let m = data[i * cols + k] / pivot;
            if !m.is_finite() {
                return Err(numeric(k, i, "non-finite multiplier", m));
            }
            Ok((i, m))
        };

        // Both paths return only after every row has been collected
        let entries = if parallel {
            (k + 1..rows)
                .into_par_iter()
                .map(multiplier)
                .collect::<Result<Vec<_>>>()?
        } else {
            (k + 1..rows).map(multiplier).collect::<Result<Vec<_>>>()?
        };

        Ok(Multipliers { stage: k, entries })
    }
}

fn numeric<T: Float>(stage: usize, row: usize, reason: &'static str, value: T) -> EliminationError {
    EliminationError::Numeric {
        stage,
        row,
        reason,
        value: value.to_f64().unwrap_or(f64::NAN),
    }
}

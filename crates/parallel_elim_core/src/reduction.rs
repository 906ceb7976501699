//! Row-reduction phase of an elimination stage
//!
//! Every active row `i > k` subtracts `m_i` times the pivot row from itself,
//! including the RHS entry. Each task owns exactly one row through an
//! [`ActiveRow`] handle and only reads the pivot row, so tasks never contend
//! and the result does not depend on the order in which they run.

use num_traits::Float;
use rayon::prelude::*;
use tracing::trace;

use crate::error::{EliminationError, Result};
use crate::multiplier::Multipliers;
use crate::store::{ActiveRow, MatrixStore};

/// Applies the materialized multipliers of a stage
pub struct RowReductionStage;

impl RowReductionStage {
    /// Reduce every active row of stage `k`
    ///
    /// `multipliers` must come from the multiplier phase of the same stage.
    /// A row with no materialized multiplier is a `DependencyViolation`: the
    /// value is never recomputed here.
    pub fn apply<T>(
        store: &mut MatrixStore<T>,
        multipliers: &Multipliers<T>,
        k: usize,
        parallel: bool,
    ) -> Result<()>
    where
        T: Float + Send + Sync,
    {
        let (rows, cols) = store.dims();
        if k >= cols.saturating_sub(1) {
            return Err(EliminationError::index("stage", k, cols.saturating_sub(1)));
        }
        if k + 1 >= rows {
            return Ok(());
        }

        let partition = store.partition(k)?;
        let pivot_row = partition.pivot_row;
        let pivot_rhs = partition.pivot_rhs;

        // Every row's multiplier is resolved before any row is written, so a
        // dependency violation leaves the store untouched
        let work = partition
            .active
            .into_iter()
            .map(|row| lookup(multipliers, k, row.index).map(|m| (row, m)))
            .collect::<Result<Vec<_>>>()?;

        let reduce = |(row, m): (ActiveRow<'_, T>, T)| reduce_row(row, pivot_row, pivot_rhs, m);

        // for_each joins every task before returning
        if parallel {
            work.into_par_iter().for_each(reduce);
        } else {
            work.into_iter().for_each(reduce);
        }
        Ok(())
    }
}

fn lookup<T: Copy>(multipliers: &Multipliers<T>, stage: usize, row: usize) -> Result<T> {
    if multipliers.stage() != stage {
        return Err(EliminationError::DependencyViolation { stage, row });
    }
    multipliers
        .get(row)
        .ok_or(EliminationError::DependencyViolation { stage, row })
}

fn reduce_row<T: Float>(row: ActiveRow<'_, T>, pivot_row: &[T], pivot_rhs: T, m: T) {
    trace!(row = row.index, "reducing row");
    for (cell, &p) in row.cells.iter_mut().zip(pivot_row) {
        *cell = *cell - m * p;
    }
    *row.rhs = *row.rhs - m * pivot_rhs;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiplier::MultiplierStage;

    #[test]
    fn test_example_stage_zero() {
        let mut store: MatrixStore<f64> = MatrixStore::example().unwrap();
        let m = MultiplierStage::compute(&store, 0, true).unwrap();
        RowReductionStage::apply(&mut store, &m, 0, true).unwrap();

        assert_eq!(store.matrix().row(0).unwrap(), &[2.0, 1.0, 1.0]);
        assert_eq!(store.matrix().row(1).unwrap(), &[0.0, 1.0, 1.0]);
        assert_eq!(store.matrix().row(2).unwrap(), &[0.0, 3.0, 5.0]);
        assert_eq!(store.rhs(), &[5.0, 0.0, 4.0]);
    }

    #[test]
    fn test_pivot_row_untouched() {
        let mut store: MatrixStore<f64> = MatrixStore::example().unwrap();
        let before = store.clone();
        let m = MultiplierStage::compute(&store, 0, false).unwrap();
        RowReductionStage::apply(&mut store, &m, 0, false).unwrap();
        assert_eq!(store.matrix().row(0), before.matrix().row(0));
        assert_eq!(store.read_rhs(0), before.read_rhs(0));
    }

    #[test]
    fn test_wrong_stage_multipliers() {
        let mut store: MatrixStore<f64> = MatrixStore::example().unwrap();
        let m = MultiplierStage::compute(&store, 0, true).unwrap();
        let before = store.clone();
        let err = RowReductionStage::apply(&mut store, &m, 1, true).unwrap_err();
        assert_eq!(err, EliminationError::DependencyViolation { stage: 1, row: 2 });
        assert_eq!(store, before);
    }

    #[test]
    fn test_missing_multiplier() {
        let mut store: MatrixStore<f64> = MatrixStore::example().unwrap();
        let partial = Multipliers::from_entries(0, vec![(1, 2.0)]);
        let err = RowReductionStage::apply(&mut store, &partial, 0, false).unwrap_err();
        assert_eq!(err, EliminationError::DependencyViolation { stage: 0, row: 2 });
    }

    #[test]
    fn test_missing_multiplier_leaves_store_untouched() {
        let before: MatrixStore<f64> = MatrixStore::example().unwrap();
        for parallel in [true, false] {
            let mut store = before.clone();
            // Row 2 has a multiplier, row 1 does not
            let partial = Multipliers::from_entries(0, vec![(2, 4.0)]);
            let err = RowReductionStage::apply(&mut store, &partial, 0, parallel).unwrap_err();
            assert_eq!(err, EliminationError::DependencyViolation { stage: 0, row: 1 });
            assert_eq!(store, before);
        }
    }

    #[test]
    fn test_huge_stage_index() {
        let mut store: MatrixStore<f64> = MatrixStore::example().unwrap();
        let m = MultiplierStage::compute(&store, 0, true).unwrap();
        assert!(matches!(
            RowReductionStage::apply(&mut store, &m, usize::MAX, true),
            Err(EliminationError::IndexOutOfRange { axis: "stage", index: usize::MAX, bound: 2 })
        ));
    }

    #[test]
    fn test_parallel_matches_inline() {
        let rows = vec![
            vec![4.0, -1.0, 0.5, 2.0],
            vec![1.0, 3.0, -2.0, 0.25],
            vec![-3.0, 0.5, 6.0, 1.0],
            vec![2.0, 2.0, 2.0, 9.0],
        ];
        let matrix = crate::matrix::Matrix::from_rows(&rows).unwrap();
        let base = MatrixStore::new(matrix, vec![1.0, -2.0, 0.5, 3.0]).unwrap();

        let mut par = base.clone();
        let mut seq = base;
        let m = MultiplierStage::compute(&par, 0, true).unwrap();
        RowReductionStage::apply(&mut par, &m, 0, true).unwrap();
        RowReductionStage::apply(&mut seq, &m, 0, false).unwrap();
        assert_eq!(par, seq);
    }
}

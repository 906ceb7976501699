//! Stage scheduler
//!
//! Drives forward elimination one stage at a time:
//!
//! ```text
//! Idle -> ComputingMultipliers(0) -> Reducing(0) -> ComputingMultipliers(1) -> ... -> Done
//! ```
//!
//! Each phase fans out over the active rows and is followed by a barrier:
//! the reduction of stage `k` starts only after every multiplier of stage `k`
//! is materialized, and stage `k + 1` starts only after every row of stage `k`
//! is reduced, because its pivot row is one of those rows. Any failing row
//! task fails the phase and aborts the whole run.

use std::fmt;
use std::time::Instant;

use num_traits::Float;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::error::{EliminationError, Result};
use crate::multiplier::{MultiplierStage, Multipliers};
use crate::reduction::RowReductionStage;
use crate::store::MatrixStore;

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    ComputingMultipliers(usize),
    Reducing(usize),
    Done,
    /// Aborted at the given stage
    Failed(usize),
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::ComputingMultipliers(k) => write!(f, "computing multipliers (stage {})", k),
            Self::Reducing(k) => write!(f, "reducing (stage {})", k),
            Self::Done => write!(f, "done"),
            Self::Failed(k) => write!(f, "failed (stage {})", k),
        }
    }
}

/// Hooks invoked by the scheduler at its barriers
///
/// All methods default to no-ops.
pub trait StageObserver<T> {
    /// The scheduler entered `state`
    fn state_changed(&mut self, _state: SchedulerState) {}

    /// Multiplier barrier crossed; `store` is still in its pre-reduction state
    fn multipliers_ready(&mut self, _store: &MatrixStore<T>, _multipliers: &Multipliers<T>) {}

    /// Reduction barrier crossed for `stage`
    fn stage_complete(&mut self, _stage: usize, _store: &MatrixStore<T>) {}
}

/// Observer that ignores every event
pub struct NoopObserver;

impl<T> StageObserver<T> for NoopObserver {}

/// Timing breakdown of a run, in seconds
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    pub total_time: f64,
    pub multiplier_time: f64,
    pub reduction_time: f64,
    pub num_stages: usize,
}

/// Everything a run produced besides the echelon system itself
#[derive(Debug, Clone)]
pub struct EliminationReport<T> {
    pub timings: StageTimings,
    /// Materialized multipliers, indexed by stage
    pub multipliers: Vec<Multipliers<T>>,
}

/// Successful run: the system in row-echelon form plus its report
#[derive(Debug, Clone)]
pub struct Elimination<T> {
    pub store: MatrixStore<T>,
    pub report: EliminationReport<T>,
}

/// Owns the system for the whole run and sequences its stages
pub struct StageScheduler<T> {
    store: MatrixStore<T>,
    config: SchedulerConfig,
    state: SchedulerState,
}

impl<T: Float + Send + Sync> StageScheduler<T> {
    pub fn new(store: MatrixStore<T>) -> Self {
        Self::with_config(store, SchedulerConfig::default())
    }

    pub fn with_config(store: MatrixStore<T>, config: SchedulerConfig) -> Self {
        Self {
            store,
            config,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of stages a run performs (`cols - 1`)
    pub fn stage_count(&self) -> usize {
        self.store.cols().saturating_sub(1)
    }

    /// Eliminate to row-echelon form
    pub fn run(self) -> Result<Elimination<T>> {
        self.run_observed(&mut NoopObserver)
    }

    /// Eliminate to row-echelon form, reporting barriers to `observer`
    ///
    /// On failure the store is dropped: no partial result is returned.
    pub fn run_observed<O>(self, observer: &mut O) -> Result<Elimination<T>>
    where
        O: StageObserver<T> + Send,
    {
        match self.config.num_threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("elim-worker-{}", i))
                    .build()?;
                pool.install(move || self.drive(observer))
            }
            None => self.drive(observer),
        }
    }

    fn drive<O: StageObserver<T>>(mut self, observer: &mut O) -> Result<Elimination<T>> {
        let start = Instant::now();
        let stages = self.stage_count();
        let mut timings = StageTimings::default();
        let mut all_multipliers = Vec::with_capacity(stages);

        info!(
            rows = self.store.rows(),
            cols = self.store.cols(),
            stages,
            "starting forward elimination"
        );

        for k in 0..stages {
            let active_rows = self.store.rows().saturating_sub(k + 1);
            let parallel = active_rows >= self.config.parallel_threshold;

            self.transition(SchedulerState::ComputingMultipliers(k), observer);
            let phase_start = Instant::now();
            let multipliers = match MultiplierStage::compute(&self.store, k, parallel) {
                Ok(m) => m,
                Err(err) => return Err(self.abort(k, err, observer)),
            };
            timings.multiplier_time += phase_start.elapsed().as_secs_f64();
            debug!(stage = k, active_rows, parallel, "multiplier barrier crossed");
            observer.multipliers_ready(&self.store, &multipliers);

            self.transition(SchedulerState::Reducing(k), observer);
            let phase_start = Instant::now();
            if let Err(err) = RowReductionStage::apply(&mut self.store, &multipliers, k, parallel) {
                return Err(self.abort(k, err, observer));
            }
            timings.reduction_time += phase_start.elapsed().as_secs_f64();
            debug!(stage = k, active_rows, "reduction barrier crossed");
            observer.stage_complete(k, &self.store);

            all_multipliers.push(multipliers);
            timings.num_stages += 1;
        }

        self.transition(SchedulerState::Done, observer);
        timings.total_time = start.elapsed().as_secs_f64();
        info!(
            stages = timings.num_stages,
            total_ms = timings.total_time * 1000.0,
            "forward elimination complete"
        );

        Ok(Elimination {
            store: self.store,
            report: EliminationReport {
                timings,
                multipliers: all_multipliers,
            },
        })
    }

    fn transition<O: StageObserver<T>>(&mut self, state: SchedulerState, observer: &mut O) {
        debug!(from = %self.state, to = %state, "scheduler transition");
        self.state = state;
        observer.state_changed(state);
    }

    fn abort<O: StageObserver<T>>(
        &mut self,
        stage: usize,
        err: EliminationError,
        observer: &mut O,
    ) -> EliminationError {
        warn!(stage, error = %err, "elimination aborted");
        self.transition(SchedulerState::Failed(stage), observer);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;

    #[derive(Default)]
    struct Recorder {
        states: Vec<SchedulerState>,
        snapshots: Vec<(usize, MatrixStore<f64>, Multipliers<f64>)>,
        completed: Vec<usize>,
    }

    impl StageObserver<f64> for Recorder {
        fn state_changed(&mut self, state: SchedulerState) {
            self.states.push(state);
        }

        fn multipliers_ready(&mut self, store: &MatrixStore<f64>, multipliers: &Multipliers<f64>) {
            self.snapshots
                .push((multipliers.stage(), store.clone(), multipliers.clone()));
        }

        fn stage_complete(&mut self, stage: usize, _store: &MatrixStore<f64>) {
            self.completed.push(stage);
        }
    }

    fn system(rows: &[Vec<f64>], rhs: Vec<f64>) -> MatrixStore<f64> {
        MatrixStore::new(Matrix::from_rows(rows).unwrap(), rhs).unwrap()
    }

    #[test]
    fn test_end_to_end_example() {
        let store: MatrixStore<f64> = MatrixStore::example().unwrap();
        let result = StageScheduler::new(store).run().unwrap();
        let m = result.store.matrix();

        assert_eq!(m.row(0).unwrap(), &[2.0, 1.0, 1.0]);
        assert_eq!(m.row(1).unwrap(), &[0.0, 1.0, 1.0]);
        assert_eq!(m.row(2).unwrap(), &[0.0, 0.0, 2.0]);
        assert_eq!(result.store.rhs(), &[5.0, 0.0, 4.0]);

        let used: Vec<Vec<(usize, f64)>> = result
            .report
            .multipliers
            .iter()
            .map(|m| m.iter().collect())
            .collect();
        assert_eq!(used, vec![vec![(1, 2.0), (2, 4.0)], vec![(2, 3.0)]]);
        assert_eq!(result.report.timings.num_stages, 2);
    }

    #[test]
    fn test_state_sequence() {
        let mut recorder = Recorder::default();
        let store: MatrixStore<f64> = MatrixStore::example().unwrap();
        let scheduler = StageScheduler::new(store);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        scheduler.run_observed(&mut recorder).unwrap();

        use SchedulerState::*;
        assert_eq!(
            recorder.states,
            vec![
                ComputingMultipliers(0),
                Reducing(0),
                ComputingMultipliers(1),
                Reducing(1),
                Done
            ]
        );
        assert_eq!(recorder.completed, vec![0, 1]);
    }

    #[test]
    fn test_multipliers_observed_before_reduction() {
        let mut recorder = Recorder::default();
        let store = system(
            &[
                vec![4.0, 2.0, -1.0, 3.0],
                vec![2.0, 5.0, 1.0, -2.0],
                vec![-1.0, 1.0, 6.0, 0.5],
                vec![3.0, -2.0, 0.5, 7.0],
            ],
            vec![1.0, 2.0, 3.0, 4.0],
        );
        StageScheduler::new(store).run_observed(&mut recorder).unwrap();

        assert_eq!(recorder.snapshots.len(), 3);
        for (k, before, multipliers) in &recorder.snapshots {
            let pivot = before.read(*k, *k).unwrap();
            for (i, m) in multipliers.iter() {
                assert_eq!(m, before.read(i, *k).unwrap() / pivot);
            }
        }
    }

    #[test]
    fn test_zero_pivot_aborts() {
        let mut recorder = Recorder::default();
        let store = system(&[vec![0.0, 1.0], vec![1.0, 1.0]], vec![1.0, 2.0]);
        let err = StageScheduler::new(store)
            .run_observed(&mut recorder)
            .unwrap_err();

        assert!(matches!(
            err,
            EliminationError::Numeric { stage: 0, row: 0, .. }
        ));
        assert_eq!(err.stage(), Some(0));
        assert_eq!(
            recorder.states,
            vec![SchedulerState::ComputingMultipliers(0), SchedulerState::Failed(0)]
        );
        assert!(recorder.completed.is_empty());
    }

    #[test]
    fn test_zero_pivot_at_later_stage() {
        // Stage 0 leaves a zero at (1, 1)
        let store = system(
            &[vec![1.0, 2.0, 3.0], vec![2.0, 4.0, 1.0], vec![1.0, 1.0, 1.0]],
            vec![1.0, 1.0, 1.0],
        );
        let err = StageScheduler::new(store).run().unwrap_err();
        assert!(matches!(
            err,
            EliminationError::Numeric { stage: 1, row: 1, reason: "zero pivot", .. }
        ));
    }

    #[test]
    fn test_tall_system() {
        // 5×3: two stages, rows 3 and 4 only ever receive updates
        let store = system(
            &[
                vec![2.0, 1.0, 1.0],
                vec![4.0, 3.0, 3.0],
                vec![8.0, 7.0, 9.0],
                vec![6.0, 4.0, 5.0],
                vec![2.0, 2.0, 2.0],
            ],
            vec![5.0, 10.0, 24.0, 17.0, 6.0],
        );
        let result = StageScheduler::new(store).run().unwrap();
        let m = result.store.matrix();
        for i in 1..5 {
            assert_eq!(m.read(i, 0).unwrap(), 0.0);
        }
        for i in 2..5 {
            assert_eq!(m.read(i, 1).unwrap(), 0.0);
        }
        assert_eq!(result.report.multipliers[1].len(), 3);
    }

    #[test]
    fn test_wide_system_skips_empty_stages() {
        // 2×4: stage 0 has one active row, stages 1 and 2 have none
        let store = system(
            &[vec![1.0, 2.0, 3.0, 4.0], vec![3.0, 1.0, 0.0, 2.0]],
            vec![1.0, 1.0],
        );
        let mut recorder = Recorder::default();
        let result = StageScheduler::new(store)
            .run_observed(&mut recorder)
            .unwrap();
        assert_eq!(result.report.timings.num_stages, 3);
        assert!(result.report.multipliers[1].is_empty());
        assert!(result.report.multipliers[2].is_empty());
        assert_eq!(result.store.matrix().row(1).unwrap(), &[0.0, -5.0, -9.0, -10.0]);
        assert_eq!(recorder.completed, vec![0, 1, 2]);
    }

    #[test]
    fn test_single_column_has_no_stages() {
        let store = system(&[vec![3.0], vec![4.0]], vec![1.0, 2.0]);
        let result = StageScheduler::new(store.clone()).run().unwrap();
        assert_eq!(result.store, store);
        assert!(result.report.multipliers.is_empty());
    }

    #[test]
    fn test_dedicated_pool_matches_global() {
        let config = SchedulerConfig {
            parallel_threshold: 1,
            num_threads: Some(2),
        };
        let a = StageScheduler::with_config(MatrixStore::<f64>::example().unwrap(), config)
            .run()
            .unwrap();
        let b = StageScheduler::new(MatrixStore::<f64>::example().unwrap())
            .run()
            .unwrap();
        assert_eq!(a.store, b.store);
    }

    #[test]
    fn test_sequential_config() {
        let scheduler = StageScheduler::with_config(
            MatrixStore::<f64>::example().unwrap(),
            SchedulerConfig::sequential(),
        );
        assert_eq!(scheduler.stage_count(), 2);
        let result = scheduler.run().unwrap();
        assert_eq!(result.store.rhs(), &[5.0, 0.0, 4.0]);
    }
}

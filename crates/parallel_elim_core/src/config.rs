//! Run configuration
//!
//! The defaults reproduce the fixed-size build: a 5×3 system populated with
//! pseudo-random integers below 100.

use num_traits::Float;

use crate::error::Result;
use crate::generate::{DiagonallyDominantGenerator, UniformIntGenerator};
use crate::store::MatrixStore;

/// Default number of matrix rows (and RHS length)
pub const DEFAULT_ROWS: usize = 5;
/// Default number of matrix columns
pub const DEFAULT_COLS: usize = 3;
/// Exclusive upper bound for uniformly generated cell values
pub const DEFAULT_VALUE_BOUND: u32 = 100;
/// Seed used when none is given
pub const DEFAULT_SEED: u64 = 0x5eed;

/// Configuration for the stage scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Minimum number of active rows before a phase is dispatched to the pool.
    /// Smaller phases run inline on the scheduler thread.
    pub parallel_threshold: usize,
    /// Size of a dedicated worker pool; `None` uses the global rayon pool
    pub num_threads: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 1,
            num_threads: None,
        }
    }
}

impl SchedulerConfig {
    /// Every phase runs inline, one row after another
    pub fn sequential() -> Self {
        Self {
            parallel_threshold: usize::MAX,
            num_threads: None,
        }
    }
}

/// How the initial system is populated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    /// Pseudo-random integers in `[0, DEFAULT_VALUE_BOUND)`; may hit a zero pivot
    Uniform,
    /// Strictly diagonally dominant; every pivot is nonzero
    DiagonallyDominant,
    /// The fixed 3×3 worked example
    Example,
}

/// Full configuration of one elimination run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub rows: usize,
    pub cols: usize,
    pub seed: u64,
    pub dataset: Dataset,
    pub scheduler: SchedulerConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            seed: DEFAULT_SEED,
            dataset: Dataset::Uniform,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl RunConfig {
    /// Create and populate the system described by this configuration
    ///
    /// `Dataset::Example` ignores `rows`, `cols` and `seed`.
    pub fn build_system<T: Float + From<f32>>(&self) -> Result<MatrixStore<T>> {
        match self.dataset {
            Dataset::Example => MatrixStore::example(),
            Dataset::Uniform => {
                let mut store = MatrixStore::create(self.rows, self.cols)?;
                let mut cells = UniformIntGenerator::new(self.seed);
                store.fill(&mut cells);
                let mut rhs = UniformIntGenerator::new(self.seed.wrapping_add(1));
                store.fill_vector(&mut rhs);
                Ok(store)
            }
            Dataset::DiagonallyDominant => {
                let mut store = MatrixStore::create(self.rows, self.cols)?;
                let mut cells = DiagonallyDominantGenerator::new(self.seed, self.cols);
                store.fill(&mut cells);
                let mut rhs = UniformIntGenerator::new(self.seed.wrapping_add(1));
                store.fill_vector(&mut rhs);
                Ok(store)
            }
        }
    }
}

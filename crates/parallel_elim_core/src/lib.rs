//! Parallel Elim Core Library
//!
//! Task-parallel forward Gaussian elimination of dense linear systems.
//!
//! # Overview
//!
//! An augmented system `[A | b]` is reduced to row-echelon form one stage
//! per pivot column. Every stage runs two phases over its active rows, each
//! fanned out over a rayon pool and closed by a barrier:
//!
//! ```text
//! stage k:  [multipliers m_i = A[i][k] / A[k][k]]  ->  barrier
//!           [A[i][..] -= m_i * A[k][..], b[i] -= m_i * b[k]]  ->  barrier
//! ```
//!
//! No pivoting is performed: a zero or non-finite pivot aborts the run.
//!
//! # Key Components
//!
//! - [`matrix`] - Dense row-major storage
//! - [`store`] - Augmented system with per-stage row ownership partitioning
//! - [`generate`] - Seeded value generators for populating systems
//! - [`multiplier`] - Multiplier phase
//! - [`reduction`] - Row-reduction phase
//! - [`scheduler`] - Stage sequencing and barriers
//! - [`config`] - Run and scheduler configuration

pub mod config;
pub mod error;
pub mod generate;
pub mod matrix;
pub mod multiplier;
pub mod reduction;
pub mod scheduler;
pub mod store;

mod proptests;

pub use config::{Dataset, RunConfig, SchedulerConfig, DEFAULT_COLS, DEFAULT_ROWS, DEFAULT_SEED};
pub use error::{EliminationError, Result};
pub use generate::{DiagonallyDominantGenerator, UniformIntGenerator, ValueGenerator};
pub use matrix::Matrix;
pub use multiplier::{MultiplierStage, Multipliers};
pub use reduction::RowReductionStage;
pub use scheduler::{
    Elimination, EliminationReport, NoopObserver, SchedulerState, StageObserver, StageScheduler,
    StageTimings,
};
pub use store::{ActiveRow, MatrixStore, StagePartition};

//! Error types for the elimination engine

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EliminationError {
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    Dimension {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{axis} index {index} out of range (bound {bound})")]
    IndexOutOfRange {
        axis: &'static str,
        index: usize,
        bound: usize,
    },

    #[error("Numeric failure at stage {stage}, row {row}: {reason} (value {value})")]
    Numeric {
        stage: usize,
        row: usize,
        reason: &'static str,
        value: f64,
    },

    #[error("Stage {stage}, row {row}: reduction found no materialized multiplier")]
    DependencyViolation { stage: usize, row: usize },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl EliminationError {
    /// Stage at which the run aborted, if the error is tied to one
    pub fn stage(&self) -> Option<usize> {
        match self {
            Self::Numeric { stage, .. } | Self::DependencyViolation { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub(crate) fn index(axis: &'static str, index: usize, bound: usize) -> Self {
        Self::IndexOutOfRange { axis, index, bound }
    }
}

impl From<rayon::ThreadPoolBuildError> for EliminationError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EliminationError>;

//! Benchmark setup error type.

use ophac_core::{DissimilarityError, OphacError, QuiverError};

/// Errors that may occur while preparing a benchmark workload.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// The generated rows did not form a dissimilarity matrix.
    #[error("workload matrix is invalid: {0}")]
    Dissimilarity(#[from] DissimilarityError),
    /// The generated order constraint was rejected.
    #[error("workload order is invalid: {0}")]
    Order(#[from] QuiverError),
    /// Engine configuration or generation failed.
    #[error("engine failed: {0}")]
    Engine(#[from] OphacError),
}

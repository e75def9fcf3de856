use ophac_core::{DissimilarityMatrix, Engine};

/// Builds a validated matrix from full rows.
#[must_use]
pub fn matrix<R: AsRef<[f64]>>(rows: &[R]) -> DissimilarityMatrix {
    DissimilarityMatrix::from_rows(rows).expect("rows must form a dissimilarity")
}

/// Builds an engine with the default norm order and tie-break.
#[must_use]
pub fn engine(linkage: &str) -> Engine {
    Engine::new(linkage, 1.0, 1e-12).expect("linkage must be supported")
}

//! Seeded benchmark workloads.

use ophac_core::{DissimilarityMatrix, Quiver};
use ophac_test_support::fixtures::{distinct_rows, forward_edges, tied_rows};

use crate::{error::BenchSetupError, params::GenerateBenchParams};

/// Inputs for one call to `Engine::generate`.
#[derive(Clone, Debug)]
pub struct Workload {
    /// Dissimilarity over the benchmark items.
    pub matrix: DissimilarityMatrix,
    /// Order constraint, absent when the items are unordered.
    pub order: Option<Quiver>,
}

impl Workload {
    /// Builds the workload described by `params` from `seed`.
    ///
    /// # Errors
    /// Returns [`BenchSetupError`] when the generated inputs are rejected.
    pub fn generate(params: &GenerateBenchParams, seed: u64) -> Result<Self, BenchSetupError> {
        let rows = match params.levels {
            Some(levels) => tied_rows(seed, params.items, levels),
            None => distinct_rows(seed, params.items),
        };
        let matrix = DissimilarityMatrix::from_rows(&rows)?;
        let order = if params.order_density > 0.0 {
            let edges = forward_edges(seed, params.items, params.order_density);
            Some(Quiver::from_edges(params.items, &edges)?)
        } else {
            None
        };
        Ok(Self { matrix, order })
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests require contextual panics")]
mod tests {
    use super::*;

    #[test]
    fn workloads_match_their_parameters() {
        let params = GenerateBenchParams {
            items: 6,
            levels: Some(2),
            order_density: 0.3,
        };
        let workload = Workload::generate(&params, 9).expect("workload must build");
        assert_eq!(workload.matrix.size(), 6);
        assert_eq!(workload.order.map(|order| order.node_count()), Some(6));
    }

    #[test]
    fn unordered_workloads_have_no_constraint() {
        let params = GenerateBenchParams {
            items: 4,
            levels: None,
            order_density: 0.0,
        };
        let workload = Workload::generate(&params, 9).expect("workload must build");
        assert!(workload.order.is_none());
    }
}

//! Deduplication of terminal paths by their implied ultrametric.
//!
//! Different merge orders over tied levels often describe the same
//! clustering. Two paths are duplicates exactly when their ultrametrics are
//! bit-for-bit equal; the comparison deliberately has no tolerance, because
//! every height is derived deterministically from the same input.

use std::collections::HashSet;

use tracing::trace;

use crate::dendrogram::{Dendrogram, DendrogramError};

use super::Termination;

/// Exact, hashable image of an ultrametric.
#[derive(Debug, Eq, Hash, PartialEq)]
struct Fingerprint(Vec<u64>);

impl Fingerprint {
    #[expect(
        clippy::float_arithmetic,
        reason = "adding zero folds -0.0 into 0.0"
    )]
    fn of(path: &Dendrogram, leaf_count: usize) -> Result<Self, DendrogramError> {
        let ultrametric = path.ultrametric(leaf_count, 0.0)?;
        // `+ 0.0` folds -0.0 into 0.0 so both zeros hash alike.
        Ok(Self(
            ultrametric
                .condensed()
                .iter()
                .map(|value| (value + 0.0).to_bits())
                .collect(),
        ))
    }
}

/// Collects the topologically distinct terminal paths of one search.
#[derive(Debug)]
pub(crate) struct CandidateRegistry {
    leaf_count: usize,
    seen: HashSet<Fingerprint>,
    candidates: Vec<Dendrogram>,
    terminals: usize,
}

impl CandidateRegistry {
    pub(crate) fn new(leaf_count: usize) -> Self {
        Self {
            leaf_count,
            seen: HashSet::new(),
            candidates: Vec::new(),
            terminals: 0,
        }
    }

    /// Records a terminal path; returns `false` when it duplicates an earlier
    /// candidate.
    pub(crate) fn register(
        &mut self,
        path: Dendrogram,
        termination: Termination,
    ) -> Result<bool, DendrogramError> {
        self.terminals += 1;
        let fingerprint = Fingerprint::of(&path, self.leaf_count)?;
        if !self.seen.insert(fingerprint) {
            trace!(
                merges = path.len(),
                ?termination,
                "discarding duplicate dendrogram"
            );
            return Ok(false);
        }
        self.candidates.push(path);
        Ok(true)
    }

    /// Returns the surviving candidates and the number of terminals seen.
    pub(crate) fn finish(self) -> (Vec<Dendrogram>, usize) {
        (self.candidates, self.terminals)
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests require contextual panics")]
mod tests {
    use super::*;

    use crate::dendrogram::Merge;

    fn chain(steps: &[(usize, usize, f64)]) -> Dendrogram {
        steps
            .iter()
            .map(|&(a, b, height)| Merge::new(a, b, height))
            .collect()
    }

    #[test]
    fn drops_reordered_tied_merges() {
        let mut registry = CandidateRegistry::new(4);
        // {0,1} then {2,3} versus {2,3} then {0,1}, both at height 1.
        let first = chain(&[(0, 1, 1.0), (1, 2, 1.0), (0, 1, 3.0)]);
        let second = chain(&[(2, 3, 1.0), (0, 1, 1.0), (0, 1, 3.0)]);

        assert!(registry.register(first, Termination::Collapsed).expect("valid path"));
        assert!(!registry.register(second, Termination::Collapsed).expect("valid path"));

        let (candidates, terminals) = registry.finish();
        assert_eq!(candidates.len(), 1);
        assert_eq!(terminals, 2);
    }

    #[test]
    fn keeps_distinct_topologies() {
        let mut registry = CandidateRegistry::new(3);
        let left = chain(&[(0, 1, 1.0), (0, 1, 2.0)]);
        let right = chain(&[(1, 2, 1.0), (0, 1, 2.0)]);

        assert!(registry.register(left, Termination::Collapsed).expect("valid path"));
        assert!(registry.register(right, Termination::Collapsed).expect("valid path"));
        assert_eq!(registry.finish().0.len(), 2);
    }

    #[test]
    fn distinguishes_partial_dendrograms_with_equal_heights() {
        let mut registry = CandidateRegistry::new(4);
        // {0,1,2},{3} versus {0,1},{2,3}: all joined pairs sit at 1.0.
        let grouped = chain(&[(0, 1, 1.0), (0, 1, 1.0)]);
        let paired = chain(&[(0, 1, 1.0), (1, 2, 1.0)]);

        assert!(registry.register(grouped, Termination::Exhausted).expect("valid path"));
        assert!(registry.register(paired, Termination::Exhausted).expect("valid path"));
    }

    #[test]
    fn negative_zero_matches_positive_zero() {
        let leaf_count = 2;
        let positive = Fingerprint::of(&chain(&[(0, 1, 0.0)]), leaf_count).expect("valid path");
        let negative = Fingerprint::of(&chain(&[(0, 1, -0.0)]), leaf_count).expect("valid path");
        assert_eq!(positive, negative);
    }

    #[test]
    fn propagates_replay_failures() {
        let mut registry = CandidateRegistry::new(2);
        let err = registry
            .register(chain(&[(0, 2, 1.0)]), Termination::Collapsed)
            .expect_err("cluster 2 does not exist");
        assert_eq!(err.code().as_str(), "DENDROGRAM_REPLAY");
    }
}

//! Persistent dendrograms and their implied ultrametrics.
//!
//! The search extends a dendrogram along every branch, so [`Dendrogram`] is a
//! shared, append-only list: [`Dendrogram::extend`] allocates one link that
//! points at the parent and never copies or mutates it. Sibling branches share
//! their common prefix.

use core::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::{
    dissimilarity::{DissimilarityMatrix, condensed_index, condensed_len},
    error::define_error_codes,
    partition::{Partition, PartitionError},
};

/// Errors raised while replaying a [`Dendrogram`] over a set of leaves.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DendrogramError {
    /// A merge referenced clusters that do not exist at that step.
    #[error("merge {step} cannot be replayed: {source}")]
    Replay {
        /// Zero-based position of the offending merge.
        step: usize,
        /// Failure reported by the partition.
        #[source]
        source: PartitionError,
    },
}

define_error_codes! {
    /// Stable codes describing [`DendrogramError`] variants.
    enum DendrogramErrorCode for DendrogramError {
        /// A merge referenced clusters that do not exist at that step.
        Replay => DendrogramError::Replay { .. } => "DENDROGRAM_REPLAY",
    }
}

/// One merge step: the pair of live clusters joined and the height at which
/// they were joined.
///
/// Cluster indices refer to the clusters live just before the merge, under
/// the convention that the union takes the smaller index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Merge {
    pair: (usize, usize),
    height: f64,
}

impl Merge {
    /// Creates a merge of clusters `a` and `b` at `height`; the pair is
    /// stored in ascending order.
    #[must_use]
    pub fn new(a: usize, b: usize, height: f64) -> Self {
        Self {
            pair: (a.min(b), a.max(b)),
            height,
        }
    }

    /// Returns the merged pair, smaller index first.
    #[must_use]
    pub const fn pair(&self) -> (usize, usize) {
        self.pair
    }

    /// Returns the merge height.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }
}

struct Link {
    merge: Merge,
    len: usize,
    parent: Option<Arc<Link>>,
}

impl Drop for Link {
    // Unlinks uniquely owned ancestors one at a time so long chains do not
    // recurse once per merge.
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(link) = parent {
            parent = match Arc::try_unwrap(link) {
                Ok(mut owned) => owned.parent.take(),
                Err(_shared) => None,
            };
        }
    }
}

/// Ordered sequence of merges describing one hierarchical clustering.
///
/// # Examples
/// ```
/// use ophac_core::{Dendrogram, Merge};
///
/// let root = Dendrogram::new();
/// let first = root.extend(Merge::new(0, 1, 1.0));
/// let second = first.extend(Merge::new(0, 1, 2.0));
///
/// assert!(root.is_empty());
/// assert_eq!(first.len(), 1);
/// assert_eq!(second.heights(), vec![1.0, 2.0]);
///
/// let ultrametric = second.ultrametric(3, 0.0)?;
/// assert_eq!(ultrametric.condensed(), [1.0, 2.0, 2.0]);
/// # Ok::<(), ophac_core::DendrogramError>(())
/// ```
#[derive(Clone, Default)]
pub struct Dendrogram {
    head: Option<Arc<Link>>,
}

impl Dendrogram {
    /// Creates a dendrogram without merges.
    #[must_use]
    pub const fn new() -> Self {
        Self { head: None }
    }

    /// Returns a dendrogram with `merge` appended; `self` is left unchanged.
    #[must_use]
    pub fn extend(&self, merge: Merge) -> Self {
        Self {
            head: Some(Arc::new(Link {
                merge,
                len: self.len() + 1,
                parent: self.head.clone(),
            })),
        }
    }

    /// Returns the number of merges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.head.as_ref().map_or(0, |link| link.len)
    }

    /// Returns `true` when the dendrogram has no merges.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns the most recent merge.
    #[must_use]
    pub fn last(&self) -> Option<Merge> {
        self.head.as_ref().map(|link| link.merge)
    }

    /// Returns the height of the most recent merge.
    #[must_use]
    pub fn last_height(&self) -> Option<f64> {
        self.last().map(|merge| merge.height())
    }

    /// Returns the merges from first to last.
    #[must_use]
    pub fn merges(&self) -> Vec<Merge> {
        let mut merges = Vec::with_capacity(self.len());
        let mut cursor = self.head.as_deref();
        while let Some(link) = cursor {
            merges.push(link.merge);
            cursor = link.parent.as_deref();
        }
        merges.reverse();
        merges
    }

    /// Returns the merge heights from first to last.
    #[must_use]
    pub fn heights(&self) -> Vec<f64> {
        self.merges().iter().map(Merge::height).collect()
    }

    /// Returns `true` when the merges join `leaf_count` leaves into one
    /// cluster.
    #[must_use]
    pub fn is_complete(&self, leaf_count: usize) -> bool {
        self.len() + 1 == leaf_count
    }

    /// Replays the merges over `leaf_count` singletons and returns the final
    /// clusters.
    ///
    /// # Errors
    /// Returns [`DendrogramError::Replay`] when a merge references a cluster
    /// that does not exist at its step.
    pub fn clusters(&self, leaf_count: usize) -> Result<Partition, DendrogramError> {
        self.merges().iter().enumerate().try_fold(
            Partition::singletons(leaf_count),
            |partition, (step, merge)| {
                let (a, b) = merge.pair();
                partition
                    .merge(a, b)
                    .map_err(|source| DendrogramError::Replay { step, source })
            },
        )
    }

    /// Builds the ultrametric (cophenetic) matrix implied by the merges over
    /// `leaf_count` leaves.
    ///
    /// Each pair of leaves takes the height of the merge that first joins
    /// them. With a positive `tie_break`, every height is raised to at least
    /// the previous height plus `tie_break`, so the heights become strictly
    /// increasing. Pairs the dendrogram never joins take a completion height
    /// strictly above the top merge.
    ///
    /// # Errors
    /// Returns [`DendrogramError::Replay`] when a merge references a cluster
    /// that does not exist at its step.
    #[expect(
        clippy::float_arithmetic,
        reason = "tie-broken heights are offsets from the previous height"
    )]
    pub fn ultrametric(
        &self,
        leaf_count: usize,
        tie_break: f64,
    ) -> Result<DissimilarityMatrix, DendrogramError> {
        let mut joined: Vec<Option<f64>> = vec![None; condensed_len(leaf_count)];
        let mut partition = Partition::singletons(leaf_count);
        let mut top: Option<f64> = None;

        for (step, merge) in self.merges().into_iter().enumerate() {
            let (a, b) = merge.pair();
            let replay = |source| DendrogramError::Replay { step, source };
            let next = partition.merge(a, b).map_err(replay)?;
            let height = top.map_or(merge.height(), |previous| {
                merge.height().max(previous + tie_break)
            });

            for &left in partition.members(a).map_err(replay)? {
                for &right in partition.members(b).map_err(replay)? {
                    let (row, col) = (left.min(right), left.max(right));
                    if let Some(slot) = joined.get_mut(condensed_index(leaf_count, row, col)) {
                        *slot = Some(height);
                    }
                }
            }

            partition = next;
            top = Some(height);
        }

        let summit = top.unwrap_or(0.0);
        let completion = (summit + tie_break).max(summit.next_up());
        let values = joined
            .into_iter()
            .map(|height| height.unwrap_or(completion))
            .collect();
        Ok(DissimilarityMatrix::from_condensed_unchecked(
            leaf_count, values,
        ))
    }
}

impl PartialEq for Dendrogram {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.merges() == other.merges()
    }
}

impl fmt::Debug for Dendrogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.merges()).finish()
    }
}

impl FromIterator<Merge> for Dendrogram {
    fn from_iter<I: IntoIterator<Item = Merge>>(merges: I) -> Self {
        merges
            .into_iter()
            .fold(Self::new(), |dendrogram, merge| dendrogram.extend(merge))
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests require contextual panics")]
mod tests {
    use super::*;

    use rstest::rstest;

    fn chain(steps: &[(usize, usize, f64)]) -> Dendrogram {
        steps
            .iter()
            .map(|&(a, b, height)| Merge::new(a, b, height))
            .collect()
    }

    #[test]
    fn extension_shares_the_parent_prefix() {
        let parent = chain(&[(0, 1, 1.0)]);
        let left = parent.extend(Merge::new(0, 1, 2.0));
        let right = parent.extend(Merge::new(1, 0, 3.0));

        assert_eq!(parent.len(), 1);
        assert_eq!(left.heights(), vec![1.0, 2.0]);
        assert_eq!(right.heights(), vec![1.0, 3.0]);
        assert_eq!(right.last().map(|merge| merge.pair()), Some((0, 1)));
        assert_ne!(left, right);
    }

    #[test]
    fn ultrametric_reads_first_joining_height() {
        // ((0, 1) @ 1, (2, 3) @ 2) then everything @ 5.
        let dendrogram = chain(&[(0, 1, 1.0), (1, 2, 2.0), (0, 1, 5.0)]);
        let ultrametric = dendrogram.ultrametric(4, 0.0).expect("replay must succeed");
        assert_eq!(
            ultrametric.to_rows(),
            vec![
                vec![0.0, 1.0, 5.0, 5.0],
                vec![1.0, 0.0, 5.0, 5.0],
                vec![5.0, 5.0, 0.0, 2.0],
                vec![5.0, 5.0, 2.0, 0.0],
            ]
        );
        assert!(dendrogram.is_complete(4));
    }

    #[test]
    fn tie_break_makes_heights_strictly_increasing() {
        let dendrogram = chain(&[(0, 1, 1.0), (1, 2, 1.0), (0, 1, 1.0)]);
        let ultrametric = dendrogram.ultrametric(4, 0.25).expect("replay must succeed");
        assert_eq!(ultrametric.get(0, 1), Some(1.0));
        assert_eq!(ultrametric.get(2, 3), Some(1.25));
        assert_eq!(ultrametric.get(0, 3), Some(1.5));

        let flat = dendrogram.ultrametric(4, 0.0).expect("replay must succeed");
        assert!(flat.condensed().iter().all(|value| *value == 1.0));
    }

    #[rstest]
    #[case(0.0)]
    #[case(1e-12)]
    fn unjoined_pairs_sit_strictly_above_the_top(#[case] tie_break: f64) {
        let dendrogram = chain(&[(0, 1, 2.0)]);
        let ultrametric = dendrogram
            .ultrametric(3, tie_break)
            .expect("replay must succeed");
        let completion = ultrametric.get(0, 2).expect("in range");
        assert!(completion > 2.0);
        assert_eq!(ultrametric.get(1, 2), Some(completion));
        assert!(!dendrogram.is_complete(3));
    }

    #[test]
    fn empty_dendrogram_places_all_pairs_just_above_zero() {
        let ultrametric = Dendrogram::new()
            .ultrametric(2, 0.0)
            .expect("replay must succeed");
        assert_eq!(ultrametric.get(0, 1), Some(0.0_f64.next_up()));
    }

    #[test]
    fn long_chains_drop_without_deep_recursion() {
        let deep: Dendrogram = (0..100_000).map(|_| Merge::new(0, 1, 1.0)).collect();
        assert_eq!(deep.len(), 100_000);
        drop(deep);
    }

    #[test]
    fn dropping_a_branch_keeps_the_shared_prefix() {
        let prefix = chain(&[(0, 1, 1.0), (0, 1, 2.0)]);
        let branch = prefix.extend(Merge::new(0, 1, 3.0));
        drop(branch);
        assert_eq!(prefix.heights(), vec![1.0, 2.0]);
    }

    #[test]
    fn clusters_replay_the_final_partition() {
        let dendrogram = chain(&[(1, 3, 1.0), (0, 2, 2.0)]);
        let clusters = dendrogram.clusters(4).expect("replay must succeed");
        assert_eq!(clusters.clusters(), [vec![0, 2], vec![1, 3]]);
    }

    #[test]
    fn replay_rejects_missing_clusters() {
        let dendrogram = chain(&[(0, 1, 1.0), (1, 2, 2.0)]);
        let err = dendrogram.ultrametric(3, 0.0).expect_err("cluster 2 is gone");
        assert_eq!(err.code().as_str(), "DENDROGRAM_REPLAY");
        assert!(matches!(err, DendrogramError::Replay { step: 1, .. }));
    }
}

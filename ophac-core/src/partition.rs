//! Cluster membership of the original items.
//!
//! A [`Partition`] lists, for each live cluster, the original item indices it
//! contains. Merges follow the shared index convention: the union takes the
//! smaller index and the larger index is removed.

use thiserror::Error;

use crate::error::define_error_codes;

/// Errors raised while merging clusters of a [`Partition`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PartitionError {
    /// A merge referenced a cluster that does not exist.
    #[error("cluster {cluster} is out of range for a partition of {clusters} clusters")]
    ClusterOutOfRange {
        /// Offending cluster index.
        cluster: usize,
        /// Number of live clusters.
        clusters: usize,
    },
    /// A cluster was asked to merge with itself.
    #[error("cannot merge cluster {cluster} with itself")]
    SelfMerge {
        /// Offending cluster index.
        cluster: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`PartitionError`] variants.
    enum PartitionErrorCode for PartitionError {
        /// A merge referenced a cluster that does not exist.
        ClusterOutOfRange => PartitionError::ClusterOutOfRange { .. } => "PARTITION_CLUSTER_OUT_OF_RANGE",
        /// A cluster was asked to merge with itself.
        SelfMerge => PartitionError::SelfMerge { .. } => "PARTITION_SELF_MERGE",
    }
}

/// Grouping of the original items into live clusters.
///
/// # Examples
/// ```
/// use ophac_core::Partition;
///
/// let partition = Partition::singletons(4).merge(3, 1)?;
/// assert_eq!(partition.sizes(), vec![1, 2, 1]);
/// assert_eq!(partition.clusters()[1], [1, 3]);
/// # Ok::<(), ophac_core::PartitionError>(())
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Partition {
    clusters: Vec<Vec<usize>>,
}

impl Partition {
    /// Places each of `item_count` items in its own cluster.
    #[must_use]
    pub fn singletons(item_count: usize) -> Self {
        Self {
            clusters: (0..item_count).map(|item| vec![item]).collect(),
        }
    }

    /// Returns the number of live clusters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns `true` when the partition has no clusters.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Returns the member items of each cluster, each list sorted.
    #[must_use]
    pub fn clusters(&self) -> &[Vec<usize>] {
        &self.clusters
    }

    /// Returns the sorted members of `cluster`.
    ///
    /// # Errors
    /// Returns [`PartitionError::ClusterOutOfRange`] when `cluster` does not
    /// exist.
    pub fn members(&self, cluster: usize) -> Result<&[usize], PartitionError> {
        self.clusters
            .get(cluster)
            .map(Vec::as_slice)
            .ok_or_else(|| PartitionError::ClusterOutOfRange {
                cluster,
                clusters: self.len(),
            })
    }

    /// Returns the size of each cluster.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(Vec::len).collect()
    }

    /// Joins clusters `a` and `b`, producing a partition with one cluster
    /// fewer.
    ///
    /// # Errors
    /// Returns [`PartitionError::ClusterOutOfRange`] or
    /// [`PartitionError::SelfMerge`] for invalid indices.
    pub fn merge(&self, a: usize, b: usize) -> Result<Self, PartitionError> {
        let left = self.members(a)?;
        let right = self.members(b)?;
        if a == b {
            return Err(PartitionError::SelfMerge { cluster: a });
        }

        let mut union: Vec<usize> = left.iter().chain(right).copied().collect();
        union.sort_unstable();
        let (lo, hi) = (a.min(b), a.max(b));
        let clusters = self
            .clusters
            .iter()
            .enumerate()
            .filter(|&(index, _)| index != hi)
            .map(|(index, members)| {
                if index == lo {
                    union.clone()
                } else {
                    members.clone()
                }
            })
            .collect();
        Ok(Self { clusters })
    }
}

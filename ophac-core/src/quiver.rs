//! Partial-order constraints over the live clusters.
//!
//! A [`Quiver`] is a directed acyclic graph whose edges `a -> b` state that
//! cluster `a` precedes cluster `b`. Two clusters may merge only when neither
//! precedes the other, which is exactly the condition under which the merged
//! graph stays acyclic. Quivers are values: [`Quiver::merge`] returns a new
//! quiver and leaves the original intact for sibling branches of the search.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::error::define_error_codes;

/// Errors raised while building or merging a [`Quiver`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum QuiverError {
    /// An edge or merge referenced a node that does not exist.
    #[error("node {node} is out of range for an order constraint with {node_count} nodes")]
    NodeOutOfRange {
        /// Offending node.
        node: usize,
        /// Number of nodes in the quiver.
        node_count: usize,
    },
    /// An edge related a node to itself.
    #[error("order constraint relates node {node} to itself")]
    SelfLoop {
        /// Offending node.
        node: usize,
    },
    /// An edge closed a directed cycle.
    #[error("edge ({from}, {to}) closes a cycle in the order constraint")]
    Cycle {
        /// Source of the offending edge.
        from: usize,
        /// Target of the offending edge.
        to: usize,
    },
    /// A node was asked to merge with itself.
    #[error("cannot merge node {node} with itself")]
    SelfMerge {
        /// Offending node.
        node: usize,
    },
    /// Two comparable nodes were merged.
    #[error("nodes {a} and {b} are ordered and cannot merge")]
    NotMergeable {
        /// First node of the rejected merge.
        a: usize,
        /// Second node of the rejected merge.
        b: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`QuiverError`] variants.
    enum QuiverErrorCode for QuiverError {
        /// An edge or merge referenced a node that does not exist.
        NodeOutOfRange => QuiverError::NodeOutOfRange { .. } => "QUIVER_NODE_OUT_OF_RANGE",
        /// An edge related a node to itself.
        SelfLoop => QuiverError::SelfLoop { .. } => "QUIVER_SELF_LOOP",
        /// An edge closed a directed cycle.
        Cycle => QuiverError::Cycle { .. } => "QUIVER_CYCLE",
        /// A node was asked to merge with itself.
        SelfMerge => QuiverError::SelfMerge { .. } => "QUIVER_SELF_MERGE",
        /// Two comparable nodes were merged.
        NotMergeable => QuiverError::NotMergeable { .. } => "QUIVER_NOT_MERGEABLE",
    }
}

/// Strict partial order over cluster representatives, stored as a DAG.
///
/// # Examples
/// ```
/// use ophac_core::Quiver;
///
/// // 0 precedes 1, 1 precedes 2.
/// let quiver = Quiver::from_edges(3, &[(0, 1), (1, 2)])?;
/// assert!(quiver.precedes(0, 2));
/// assert!(!quiver.can_merge(0, 2));
///
/// let unconstrained = Quiver::unconstrained(3);
/// assert!(unconstrained.can_merge(0, 2));
/// # Ok::<(), ophac_core::QuiverError>(())
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Quiver {
    successors: Vec<BTreeSet<usize>>,
}

impl Quiver {
    /// Creates the empty relation over `node_count` nodes.
    #[must_use]
    pub fn unconstrained(node_count: usize) -> Self {
        Self {
            successors: vec![BTreeSet::new(); node_count],
        }
    }

    /// Creates a relation over `node_count` nodes from `(from, to)` edges,
    /// each stating that `from` precedes `to`.
    ///
    /// # Errors
    /// Returns [`QuiverError::NodeOutOfRange`] for edges outside the node
    /// range, [`QuiverError::SelfLoop`] for reflexive edges and
    /// [`QuiverError::Cycle`] for an edge that would close a cycle.
    pub fn from_edges(node_count: usize, edges: &[(usize, usize)]) -> Result<Self, QuiverError> {
        let mut quiver = Self::unconstrained(node_count);
        for &(from, to) in edges {
            quiver.check_node(from)?;
            quiver.check_node(to)?;
            if from == to {
                return Err(QuiverError::SelfLoop { node: from });
            }
            if quiver.precedes(to, from) {
                return Err(QuiverError::Cycle { from, to });
            }
            quiver.relate(from, to);
        }
        Ok(quiver)
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.successors.len()
    }

    /// Returns the number of stored edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(BTreeSet::len).sum()
    }

    /// Returns `true` when no node is related to any other.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.successors.iter().all(BTreeSet::is_empty)
    }

    /// Iterates over the stored `(from, to)` edges in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(from, targets)| targets.iter().map(move |&to| (from, to)))
    }

    /// Returns `true` when a directed path leads from `a` to `b`.
    ///
    /// Out-of-range nodes precede nothing.
    #[must_use]
    pub fn precedes(&self, a: usize, b: usize) -> bool {
        if a == b || a >= self.node_count() || b >= self.node_count() {
            return false;
        }
        let mut visited = BTreeSet::new();
        let mut pending = vec![a];
        while let Some(node) = pending.pop() {
            for &next in self.successors.get(node).into_iter().flatten() {
                if next == b {
                    return true;
                }
                if visited.insert(next) {
                    pending.push(next);
                }
            }
        }
        false
    }

    /// Returns `true` when `a` and `b` are distinct, in range and unordered.
    #[must_use]
    pub fn can_merge(&self, a: usize, b: usize) -> bool {
        a != b
            && a < self.node_count()
            && b < self.node_count()
            && !self.precedes(a, b)
            && !self.precedes(b, a)
    }

    /// Identifies nodes `a` and `b`, producing a quiver one node smaller.
    ///
    /// The merged node takes the smaller index and inherits the edges of
    /// both; indices above the larger one shift down by one.
    ///
    /// # Errors
    /// Returns [`QuiverError::NodeOutOfRange`] or [`QuiverError::SelfMerge`]
    /// for invalid indices and [`QuiverError::NotMergeable`] when one node
    /// precedes the other.
    pub fn merge(&self, a: usize, b: usize) -> Result<Self, QuiverError> {
        self.check_node(a)?;
        self.check_node(b)?;
        if a == b {
            return Err(QuiverError::SelfMerge { node: a });
        }
        if !self.can_merge(a, b) {
            return Err(QuiverError::NotMergeable { a, b });
        }

        let (lo, hi) = (a.min(b), a.max(b));
        let remap = |node: usize| match node.cmp(&hi) {
            core::cmp::Ordering::Less => node,
            core::cmp::Ordering::Equal => lo,
            core::cmp::Ordering::Greater => node - 1,
        };

        let mut merged = Self::unconstrained(self.node_count() - 1);
        for (source, target) in self.edges() {
            let (from, to) = (remap(source), remap(target));
            if from != to {
                merged.relate(from, to);
            }
        }
        Ok(merged)
    }

    /// Stores `from -> to`; callers have checked both nodes.
    fn relate(&mut self, from: usize, to: usize) {
        if let Some(targets) = self.successors.get_mut(from) {
            targets.insert(to);
        }
    }

    fn check_node(&self, node: usize) -> Result<(), QuiverError> {
        if node < self.node_count() {
            Ok(())
        } else {
            Err(QuiverError::NodeOutOfRange {
                node,
                node_count: self.node_count(),
            })
        }
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests require contextual panics")]
mod tests {
    use super::*;

    use rstest::{fixture, rstest};

    /// `0 -> 1 -> 3` and `2 -> 3`, with 4 unrelated.
    #[fixture]
    fn diamond() -> Quiver {
        Quiver::from_edges(5, &[(0, 1), (1, 3), (2, 3)]).expect("edges are acyclic")
    }

    #[rstest]
    fn reachability_follows_paths(diamond: Quiver) {
        assert!(diamond.precedes(0, 3));
        assert!(diamond.precedes(2, 3));
        assert!(!diamond.precedes(3, 0));
        assert!(!diamond.precedes(0, 2));
        assert!(!diamond.precedes(0, 0));
        assert!(!diamond.precedes(0, 9));
    }

    #[rstest]
    #[case(0, 2, true)]
    #[case(1, 2, true)]
    #[case(3, 4, true)]
    #[case(0, 3, false)]
    #[case(3, 1, false)]
    #[case(2, 2, false)]
    #[case(2, 7, false)]
    fn merges_only_unordered_nodes(
        diamond: Quiver,
        #[case] a: usize,
        #[case] b: usize,
        #[case] expected: bool,
    ) {
        assert_eq!(diamond.can_merge(a, b), expected);
    }

    #[rstest]
    fn merge_inherits_edges_and_shifts_indices(diamond: Quiver) {
        // {1, 2} becomes node 1; old 3 -> 2, old 4 -> 3.
        let merged = diamond.merge(2, 1).expect("1 and 2 are unordered");
        assert_eq!(merged.node_count(), 4);
        assert_eq!(merged.edges().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
        assert!(!merged.can_merge(0, 2));
        assert!(merged.can_merge(2, 3));
        assert_eq!(diamond.node_count(), 5, "merge must not mutate the source");
    }

    #[rstest]
    fn merge_keeps_transitive_constraints(diamond: Quiver) {
        // {0, 2}: the merged node precedes 3 through both parents.
        let merged = diamond.merge(0, 2).expect("0 and 2 are unordered");
        assert!(merged.precedes(0, 2));
        assert!(!merged.can_merge(0, 1));
    }

    #[rstest]
    #[case(0, 3, "QUIVER_NOT_MERGEABLE")]
    #[case(1, 1, "QUIVER_SELF_MERGE")]
    #[case(0, 5, "QUIVER_NODE_OUT_OF_RANGE")]
    fn merge_rejects_illegal_pairs(
        diamond: Quiver,
        #[case] a: usize,
        #[case] b: usize,
        #[case] code: &str,
    ) {
        let err = diamond.merge(a, b).expect_err("merge must fail");
        assert_eq!(err.code().as_str(), code);
    }

    #[rstest]
    #[case(&[(0, 3)], QuiverError::NodeOutOfRange { node: 3, node_count: 3 })]
    #[case(&[(1, 1)], QuiverError::SelfLoop { node: 1 })]
    #[case(&[(0, 1), (1, 2), (2, 0)], QuiverError::Cycle { from: 2, to: 0 })]
    fn rejects_invalid_edges(#[case] edges: &[(usize, usize)], #[case] expected: QuiverError) {
        let err = Quiver::from_edges(3, edges).expect_err("edges must be rejected");
        assert_eq!(err, expected);
    }

    #[test]
    fn unconstrained_quiver_collapses_to_one_node() {
        let mut quiver = Quiver::unconstrained(4);
        while quiver.node_count() > 1 {
            quiver = quiver.merge(0, 1).expect("unconstrained nodes merge");
        }
        assert!(quiver.is_unconstrained());
        assert_eq!(quiver.edge_count(), 0);
    }
}

//! Exhaustive search over order-consistent dendrograms.
//!
//! The search walks a tree of states `(dissimilarity, quiver, partition,
//! path)`. From each state it selects the least dissimilar level that still
//! contains a legal merge and branches over every legal pair of that level,
//! since tied pairs are alternative merge orders. A state is terminal when its
//! quiver has collapsed to one node or when no level offers a legal merge.
//!
//! The walk is depth-first over an explicit stack rather than recursive, so
//! deep searches are not bounded by the thread's stack. Terminal paths flow
//! into a registry that drops topological duplicates, and the selector scores
//! the survivors.

mod explorer;
mod registry;
pub(crate) mod selector;

use tracing::debug;

use crate::{
    Result, dendrogram::Dendrogram, dissimilarity::DissimilarityMatrix, linkage::Linkage,
    partition::Partition, quiver::Quiver,
};

use self::{
    explorer::{Expansion, expand},
    registry::CandidateRegistry,
};

/// One node of the search tree.
#[derive(Clone, Debug)]
pub(crate) struct SearchState {
    pub(crate) dissimilarity: DissimilarityMatrix,
    pub(crate) quiver: Quiver,
    pub(crate) partition: Partition,
    pub(crate) path: Dendrogram,
}

impl SearchState {
    /// Builds the root state: singleton clusters and an empty path.
    pub(crate) fn root(dissimilarity: DissimilarityMatrix, quiver: Quiver) -> Self {
        let partition = Partition::singletons(dissimilarity.size());
        Self {
            dissimilarity,
            quiver,
            partition,
            path: Dendrogram::new(),
        }
    }
}

/// Why a branch of the search stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Termination {
    /// Every item sits in one cluster.
    Collapsed,
    /// Clusters remain, but the order constraint forbids every merge.
    Exhausted,
}

/// Candidates produced by one exhaustive search, before model selection.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    candidates: Vec<Dendrogram>,
    terminal_count: usize,
}

impl SearchOutcome {
    /// Returns the topologically distinct maximal dendrograms, in discovery
    /// order.
    #[must_use]
    pub fn candidates(&self) -> &[Dendrogram] {
        &self.candidates
    }

    /// Consumes the outcome and returns its candidates.
    #[must_use]
    pub fn into_candidates(self) -> Vec<Dendrogram> {
        self.candidates
    }

    /// Returns how many terminal states the search reached, duplicates
    /// included.
    #[must_use]
    pub const fn terminal_count(&self) -> usize {
        self.terminal_count
    }

    /// Returns how many terminal paths were dropped as duplicates.
    #[must_use]
    pub const fn duplicate_count(&self) -> usize {
        self.terminal_count - self.candidates.len()
    }
}

/// Runs the search from `root` until every branch has terminated.
pub(crate) fn exhaust(root: SearchState, linkage: Linkage) -> Result<SearchOutcome> {
    let mut registry = CandidateRegistry::new(root.dissimilarity.size());
    let mut pending = vec![root];

    while let Some(state) = pending.pop() {
        match expand(state, linkage)? {
            Expansion::Terminal { path, termination } => {
                registry.register(path, termination)?;
            }
            Expansion::Branches(children) => {
                // Reversed so the first pair of a level is explored first.
                pending.extend(children.into_iter().rev());
            }
        }
    }

    let (candidates, terminal_count) = registry.finish();
    debug!(
        terminals = terminal_count,
        candidates = candidates.len(),
        "search exhausted"
    );
    Ok(SearchOutcome {
        candidates,
        terminal_count,
    })
}

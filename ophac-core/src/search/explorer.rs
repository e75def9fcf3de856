//! Expansion of a single search state.

use tracing::trace;

use crate::{
    Result,
    dendrogram::{Dendrogram, Merge},
    dissimilarity::indistinguishable,
    error::OphacError,
    linkage::Linkage,
};

use super::{SearchState, Termination};

/// Result of expanding one state.
#[derive(Debug)]
pub(super) enum Expansion {
    /// The state is terminal; its path is a finished candidate.
    Terminal {
        path: Dendrogram,
        termination: Termination,
    },
    /// One child per legal merge at the selected level.
    Branches(Vec<SearchState>),
}

pub(super) fn expand(state: SearchState, linkage: Linkage) -> Result<Expansion> {
    if state.quiver.node_count() == 1 {
        return Ok(Expansion::Terminal {
            path: state.path,
            termination: Termination::Collapsed,
        });
    }

    let level = state.dissimilarity.chunks_ascending().into_iter().find_map(|chunk| {
        let mergeable: Vec<(usize, usize)> = chunk
            .pairs()
            .iter()
            .copied()
            .filter(|&(a, b)| state.quiver.can_merge(a, b))
            .collect();
        (!mergeable.is_empty()).then(|| (chunk.distance(), mergeable))
    });
    let Some((height, mergeable)) = level else {
        return Ok(Expansion::Terminal {
            path: state.path,
            termination: Termination::Exhausted,
        });
    };

    check_monotone(&state.path, height)?;

    let sizes = state.partition.sizes();
    let rule = linkage.rule(&sizes);
    let mut children = Vec::with_capacity(mergeable.len());
    for (a, b) in mergeable {
        trace!(a, b, height, depth = state.path.len(), "branching on merge");
        children.push(SearchState {
            dissimilarity: state.dissimilarity.merged_via(&rule, a, b)?,
            quiver: state.quiver.merge(a, b)?,
            partition: state.partition.merge(a, b)?,
            path: state.path.extend(Merge::new(a, b, height)),
        });
    }

    if children.is_empty() {
        return Err(OphacError::NoBranchTaken { distance: height });
    }
    Ok(Expansion::Branches(children))
}

/// Rejects a merge at `height` that would sit below the last merge of `path`.
///
/// Heights that are numerically indistinguishable from the previous one are
/// accepted as ties.
pub(super) fn check_monotone(path: &Dendrogram, height: f64) -> Result<()> {
    match path.last_height() {
        Some(previous) if height < previous && !indistinguishable(previous, height) => {
            Err(OphacError::NonMonotoneMerge {
                step: path.len(),
                previous,
                height,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests require contextual panics")]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::{DissimilarityMatrix, Quiver};

    fn root(condensed: Vec<f64>, size: usize, quiver: Quiver) -> SearchState {
        let matrix = DissimilarityMatrix::from_condensed(size, condensed).expect("valid matrix");
        SearchState::root(matrix, quiver)
    }

    #[test]
    fn single_node_is_collapsed() {
        let state = root(Vec::new(), 1, Quiver::unconstrained(1));
        let expansion = expand(state, Linkage::Single).expect("expansion must succeed");
        assert!(matches!(
            expansion,
            Expansion::Terminal {
                termination: Termination::Collapsed,
                ..
            }
        ));
    }

    #[test]
    fn fully_ordered_items_are_exhausted() {
        let quiver = Quiver::from_edges(2, &[(0, 1)]).expect("acyclic");
        let state = root(vec![1.0], 2, quiver);
        let expansion = expand(state, Linkage::Single).expect("expansion must succeed");
        match expansion {
            Expansion::Terminal { path, termination } => {
                assert_eq!(termination, Termination::Exhausted);
                assert!(path.is_empty());
            }
            Expansion::Branches(_) => panic!("no merge is legal"),
        }
    }

    #[test]
    fn branches_over_every_tied_pair() {
        // All three pairs tied at 1.0.
        let state = root(vec![1.0, 1.0, 1.0], 3, Quiver::unconstrained(3));
        let Expansion::Branches(children) =
            expand(state, Linkage::Complete).expect("expansion must succeed")
        else {
            panic!("state must branch");
        };
        let pairs: Vec<_> = children
            .iter()
            .filter_map(|child| child.path.last().map(|merge| merge.pair()))
            .collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
        assert!(children.iter().all(|child| child.quiver.node_count() == 2));
        assert!(children.iter().all(|child| child.partition.len() == 2));
    }

    #[test]
    fn skips_levels_without_legal_pairs() {
        // d(0,1) = 1 is forbidden; the next level d(0,2) = d(1,2) = 2 branches.
        let quiver = Quiver::from_edges(3, &[(0, 1)]).expect("acyclic");
        let state = root(vec![1.0, 2.0, 2.0], 3, quiver);
        let Expansion::Branches(children) =
            expand(state, Linkage::Single).expect("expansion must succeed")
        else {
            panic!("state must branch");
        };
        let merges: Vec<_> = children.iter().filter_map(|child| child.path.last()).collect();
        assert_eq!(merges, vec![Merge::new(0, 2, 2.0), Merge::new(1, 2, 2.0)]);
    }

    #[rstest]
    #[case(2.0, true)]
    #[case(2.0_f64.next_down(), true)]
    #[case(3.0, true)]
    #[case(1.5, false)]
    fn monotone_check_tolerates_only_ties(#[case] height: f64, #[case] accepted: bool) {
        let path = Dendrogram::new().extend(Merge::new(0, 1, 2.0));
        let result = check_monotone(&path, height);
        assert_eq!(result.is_ok(), accepted);
        if let Err(err) = result {
            assert_eq!(
                err,
                OphacError::NonMonotoneMerge {
                    step: 1,
                    previous: 2.0,
                    height
                }
            );
        }
    }

    #[test]
    fn first_merge_is_always_monotone() {
        assert!(check_monotone(&Dendrogram::new(), 0.0).is_ok());
    }
}

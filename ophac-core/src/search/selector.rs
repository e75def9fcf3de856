//! Model selection among the distinct candidates of a search.

use tracing::debug;

use crate::{
    Result,
    dendrogram::Dendrogram,
    dissimilarity::{DissimilarityMatrix, NormOrder},
};

/// Measures how far the ultrametric of `candidate` lies from `dissimilarity`.
pub(crate) fn score(
    dissimilarity: &DissimilarityMatrix,
    candidate: &Dendrogram,
    norm_order: NormOrder,
    tie_break: f64,
) -> Result<f64> {
    let ultrametric = candidate.ultrametric(dissimilarity.size(), tie_break)?;
    Ok(dissimilarity.minus(&ultrametric)?.norm(norm_order))
}

/// Returns every candidate whose score equals the lowest score exactly.
///
/// A lone candidate is returned without scoring.
pub(crate) fn pick_best(
    candidates: Vec<Dendrogram>,
    dissimilarity: &DissimilarityMatrix,
    norm_order: NormOrder,
    tie_break: f64,
) -> Result<Vec<Dendrogram>> {
    if candidates.len() <= 1 {
        return Ok(candidates);
    }

    let mut scored = candidates
        .into_iter()
        .map(|candidate| {
            score(dissimilarity, &candidate, norm_order, tie_break).map(|value| (value, candidate))
        })
        .collect::<Result<Vec<_>>>()?;
    scored.sort_by(|left, right| left.0.total_cmp(&right.0));

    let best = scored.first().map_or(0.0, |(value, _)| *value);
    let winners: Vec<Dendrogram> = scored
        .into_iter()
        .take_while(|(value, _)| *value == best)
        .map(|(_, candidate)| candidate)
        .collect();
    debug!(best_score = best, ties = winners.len(), "selected best candidates");
    Ok(winners)
}

//! Top-level orchestration of order-preserving dendrogram generation.
//!
//! Provides the [`Engine`] entry point, which validates its inputs, runs the
//! exhaustive search, and selects the candidates closest to the input
//! dissimilarity.

use tracing::{info, instrument, warn};

use crate::{
    Result,
    dendrogram::Dendrogram,
    dissimilarity::{DissimilarityMatrix, NormOrder},
    error::OphacError,
    linkage::Linkage,
    quiver::Quiver,
    search::{self, SearchOutcome, SearchState, selector},
};

/// Entry point for generating optimal order-preserving dendrograms.
///
/// # Examples
/// ```
/// use ophac_core::{DissimilarityMatrix, Engine, Merge};
///
/// let engine = Engine::new("single", 1.0, 1e-12)?;
/// let matrix = DissimilarityMatrix::from_rows(&[
///     [0.0, 1.0, 4.0],
///     [1.0, 0.0, 4.0],
///     [4.0, 4.0, 0.0],
/// ])?;
/// let best = engine.generate(&matrix, None)?;
/// assert_eq!(best.len(), 1);
/// assert_eq!(best[0].merges(), vec![Merge::new(0, 1, 1.0), Merge::new(0, 1, 4.0)]);
/// # Ok::<(), ophac_core::OphacError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    linkage: Linkage,
    norm_order: NormOrder,
    tie_break: f64,
}

impl Engine {
    /// Builds an engine from a linkage name, a norm order and a tie-break
    /// increment.
    ///
    /// # Errors
    /// Returns the same configuration errors as
    /// [`EngineBuilder::build`](crate::EngineBuilder::build).
    pub fn new(linkage: &str, norm_order: f64, tie_break: f64) -> Result<Self> {
        crate::EngineBuilder::new()
            .with_linkage_name(linkage)
            .with_norm_order(norm_order)
            .with_tie_break(tie_break)
            .build()
    }

    pub(crate) const fn from_parts(linkage: Linkage, norm_order: NormOrder, tie_break: f64) -> Self {
        Self {
            linkage,
            norm_order,
            tie_break,
        }
    }

    /// Returns the linkage rule used to update dissimilarities after a merge.
    #[must_use]
    pub const fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Returns the order of the norm used to score candidates.
    #[must_use]
    pub const fn norm_order(&self) -> NormOrder {
        self.norm_order
    }

    /// Returns the increment added to non-increasing heights when scoring.
    #[must_use]
    pub const fn tie_break(&self) -> f64 {
        self.tie_break
    }

    /// Generates every optimal order-preserving dendrogram for `dissimilarity`.
    ///
    /// Without an order constraint the items are treated as an antichain.
    /// When several candidates score exactly the same, all of them are
    /// returned in discovery order.
    ///
    /// # Errors
    /// Returns [`OphacError::EmptyDissimilarity`] for a matrix without items,
    /// [`OphacError::OrderSizeMismatch`] when `order` covers a different number
    /// of items, and [`OphacError::NonMonotoneMerge`] when the linkage update
    /// produced a merge below its predecessor.
    ///
    /// # Examples
    /// ```
    /// use ophac_core::{DissimilarityMatrix, Engine, Quiver};
    ///
    /// let engine = Engine::new("complete", 1.0, 1e-12)?;
    /// let matrix = DissimilarityMatrix::from_condensed(3, vec![1.0, 1.0, 1.0])?;
    /// let order = Quiver::from_edges(3, &[(0, 1)])?;
    /// let best = engine.generate(&matrix, Some(&order))?;
    /// assert_eq!(best.len(), 2);
    /// assert!(best.iter().all(|dendrogram| dendrogram.len() == 1));
    /// # Ok::<(), ophac_core::OphacError>(())
    /// ```
    #[instrument(
        name = "ophac.generate",
        err,
        skip(self, dissimilarity, order),
        fields(
            items = dissimilarity.size(),
            linkage = %self.linkage,
            constrained = order.is_some_and(|quiver| !quiver.is_unconstrained()),
        ),
    )]
    pub fn generate(
        &self,
        dissimilarity: &DissimilarityMatrix,
        order: Option<&Quiver>,
    ) -> Result<Vec<Dendrogram>> {
        let outcome = self.explore(dissimilarity, order)?;
        let terminals = outcome.terminal_count();
        let best = selector::pick_best(
            outcome.into_candidates(),
            dissimilarity,
            self.norm_order,
            self.tie_break,
        )?;
        info!(terminals, selected = best.len(), "generation completed");
        Ok(best)
    }

    /// Runs the exhaustive search without model selection.
    ///
    /// The outcome holds every topologically distinct maximal dendrogram
    /// together with search statistics.
    ///
    /// # Errors
    /// Returns the same errors as [`Self::generate`].
    #[instrument(
        name = "ophac.explore",
        err,
        skip(self, dissimilarity, order),
        fields(items = dissimilarity.size(), linkage = %self.linkage),
    )]
    pub fn explore(
        &self,
        dissimilarity: &DissimilarityMatrix,
        order: Option<&Quiver>,
    ) -> Result<SearchOutcome> {
        let items = dissimilarity.size();
        if items == 0 {
            warn!("dissimilarity matrix is empty, returning error");
            return Err(OphacError::EmptyDissimilarity);
        }
        let quiver = match order {
            Some(quiver) if quiver.node_count() != items => {
                return Err(OphacError::OrderSizeMismatch {
                    items,
                    nodes: quiver.node_count(),
                });
            }
            Some(quiver) => quiver.clone(),
            None => Quiver::unconstrained(items),
        };
        search::exhaust(SearchState::root(dissimilarity.clone(), quiver), self.linkage)
    }

    /// Scores `dendrogram` against `dissimilarity` the way candidates are
    /// ranked: the configured norm of the difference between the matrix and
    /// the dendrogram's tie-broken ultrametric. Lower is better.
    ///
    /// # Errors
    /// Returns [`OphacError::Dendrogram`] when the dendrogram does not replay
    /// over `dissimilarity.size()` leaves.
    pub fn score(
        &self,
        dissimilarity: &DissimilarityMatrix,
        dendrogram: &Dendrogram,
    ) -> Result<f64> {
        selector::score(dissimilarity, dendrogram, self.norm_order, self.tie_break)
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests require contextual panics")]
mod tests {
    use super::*;

    use crate::dendrogram::Merge;

    fn engine(linkage: &str) -> Engine {
        Engine::new(linkage, 1.0, 1e-12).expect("configuration is valid")
    }

    #[test]
    fn rejects_empty_matrix() {
        let empty = DissimilarityMatrix::from_condensed(0, Vec::new()).expect("empty is valid");
        let err = engine("single")
            .generate(&empty, None)
            .expect_err("empty input must be rejected");
        assert_eq!(err, OphacError::EmptyDissimilarity);
    }

    #[test]
    fn rejects_mismatched_order() {
        let matrix = DissimilarityMatrix::from_condensed(2, vec![1.0]).expect("valid");
        let order = Quiver::unconstrained(3);
        let err = engine("single")
            .generate(&matrix, Some(&order))
            .expect_err("sizes differ");
        assert_eq!(err, OphacError::OrderSizeMismatch { items: 2, nodes: 3 });
    }

    #[test]
    fn single_item_yields_the_empty_dendrogram() {
        let matrix = DissimilarityMatrix::from_condensed(1, Vec::new()).expect("valid");
        let best = engine("average").generate(&matrix, None).expect("generation succeeds");
        assert_eq!(best, vec![Dendrogram::new()]);
    }

    #[test]
    fn missing_order_matches_an_antichain() {
        let matrix =
            DissimilarityMatrix::from_condensed(4, vec![1.0, 2.0, 2.0, 2.0, 2.0, 1.0])
                .expect("valid");
        let engine = engine("single");
        let implicit = engine.generate(&matrix, None).expect("generation succeeds");
        let explicit = engine
            .generate(&matrix, Some(&Quiver::unconstrained(4)))
            .expect("generation succeeds");
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn explore_reports_duplicates() {
        // Both pairs tie at 1.0, so the two merge orders collapse to one shape.
        let matrix =
            DissimilarityMatrix::from_condensed(4, vec![1.0, 2.0, 2.0, 2.0, 2.0, 1.0])
                .expect("valid");
        let outcome = engine("single").explore(&matrix, None).expect("search succeeds");
        assert_eq!(outcome.candidates().len(), 1);
        assert_eq!(outcome.terminal_count(), 2);
        assert_eq!(outcome.duplicate_count(), 1);
    }

    #[test]
    fn score_of_an_exact_fit_is_zero() {
        let matrix = DissimilarityMatrix::from_condensed(3, vec![1.0, 4.0, 4.0]).expect("valid");
        let exact: Dendrogram = [Merge::new(0, 1, 1.0), Merge::new(0, 1, 4.0)]
            .into_iter()
            .collect();
        let engine = Engine::new("single", 1.0, 0.0).expect("valid");
        assert_eq!(engine.score(&matrix, &exact).expect("replays"), 0.0);
    }
}

//! Grouping of pairs into levels of tied dissimilarity.
//!
//! Values produced by repeated linkage updates can differ from their exact
//! counterparts by a few ulps, so a level collects every value that is
//! numerically indistinguishable from the smallest value of that level.

/// Multiple of `f64::EPSILON` below which two values count as tied.
const TIE_SLACK: f64 = 8.0 * f64::EPSILON;

/// Returns `true` when `x` and `y` cannot be told apart at the precision the
/// linkage updates are computed with.
#[expect(
    clippy::float_arithmetic,
    reason = "the tie tolerance scales with the magnitude of the values"
)]
pub(crate) fn indistinguishable(x: f64, y: f64) -> bool {
    (x - y).abs() <= TIE_SLACK * x.abs().max(y.abs()).max(1.0)
}

/// Index pairs tied at one dissimilarity level.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    distance: f64,
    pairs: Vec<(usize, usize)>,
}

impl Chunk {
    /// Returns the representative dissimilarity of the level, which is the
    /// smallest value in it.
    #[must_use]
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// Returns the tied pairs as `(i, j)` with `i < j`, in row-major order.
    #[must_use]
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }
}

pub(super) fn group_ascending(pairs: impl Iterator<Item = (usize, usize, f64)>) -> Vec<Chunk> {
    let mut sorted: Vec<(usize, usize, f64)> = pairs.collect();
    sorted.sort_by(|left, right| {
        left.2
            .total_cmp(&right.2)
            .then_with(|| (left.0, left.1).cmp(&(right.0, right.1)))
    });

    let mut chunks: Vec<Chunk> = Vec::new();
    for (i, j, value) in sorted {
        match chunks.last_mut() {
            Some(chunk) if indistinguishable(chunk.distance, value) => chunk.pairs.push((i, j)),
            _ => chunks.push(Chunk {
                distance: value,
                pairs: vec![(i, j)],
            }),
        }
    }

    for chunk in &mut chunks {
        chunk.pairs.sort_unstable();
    }
    chunks
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "tie cases are built a few ulps apart"
)]
#[expect(clippy::indexing_slicing, reason = "tests inspect known chunk positions")]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(1.0, 1.0, true)]
    #[case(1.0, 1.0 + f64::EPSILON, true)]
    #[case(1.0e6, 1.0e6 * (1.0 + 4.0 * f64::EPSILON), true)]
    #[case(1.0, 1.0 + 1.0e-9, false)]
    #[case(0.0, 1.0e-12, false)]
    fn ties_are_judged_relative_to_magnitude(
        #[case] x: f64,
        #[case] y: f64,
        #[case] expected: bool,
    ) {
        assert_eq!(indistinguishable(x, y), expected);
        assert_eq!(indistinguishable(y, x), expected);
    }

    #[test]
    fn groups_tied_values_into_one_chunk() {
        let nudged = 1.0 + f64::EPSILON;
        let pairs = vec![(0, 1, 3.0), (0, 2, 1.0), (1, 2, nudged), (1, 3, 2.0)];
        let chunks = group_ascending(pairs.into_iter());

        let distances: Vec<f64> = chunks.iter().map(Chunk::distance).collect();
        assert_eq!(distances, vec![1.0, 2.0, 3.0]);
        assert_eq!(chunks[0].pairs(), [(0, 2), (1, 2)]);
        assert_eq!(chunks[1].pairs(), [(1, 3)]);
    }

    #[test]
    fn groups_nothing_for_empty_input() {
        assert!(group_ascending(std::iter::empty()).is_empty());
    }
}

//! Deterministic dissimilarity inputs and ultrametric checks.

use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::property::{pair_count, rows_from_upper};

/// Rows of pairwise absolute differences between points on a line.
///
/// # Examples
/// ```
/// use ophac_test_support::fixtures::line_rows;
///
/// let rows = line_rows(&[0.0, 1.0, 4.0]);
/// assert_eq!(rows[0], vec![0.0, 1.0, 4.0]);
/// assert_eq!(rows[2][1], 3.0);
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "entries are point differences")]
pub fn line_rows(points: &[f64]) -> Vec<Vec<f64>> {
    points
        .iter()
        .map(|a| points.iter().map(|b| (a - b).abs()).collect())
        .collect()
}

/// Random rows over `items` with entries uniform in `[1, 2)`; ties are
/// vanishingly unlikely.
#[must_use]
pub fn distinct_rows(seed: u64, items: usize) -> Vec<Vec<f64>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    rows_from_upper(
        items,
        (0..pair_count(items)).map(|_| rng.gen_range(1.0..2.0)),
    )
}

/// Random rows over `items` with integer entries in `1..=levels`.
#[must_use]
pub fn tied_rows(seed: u64, items: usize, levels: u32) -> Vec<Vec<f64>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let top = levels.max(1);
    rows_from_upper(
        items,
        (0..pair_count(items)).map(|_| f64::from(rng.gen_range(1..=top))),
    )
}

/// Random forward edges `(a, b)`, `a < b`, each kept with probability
/// `density`.
#[must_use]
pub fn forward_edges(seed: u64, nodes: usize, density: f64) -> Vec<(usize, usize)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let keep = density.clamp(0.0, 1.0);
    let mut edges = Vec::new();
    for a in 0..nodes {
        for b in a + 1..nodes {
            if rng.gen_bool(keep) {
                edges.push((a, b));
            }
        }
    }
    edges
}

/// Returns a triple `(i, j, k)` with `d(i, j) > max(d(i, k), d(k, j))`, or
/// `None` when `rows` satisfy the ultrametric inequality.
///
/// # Examples
/// ```
/// use ophac_test_support::fixtures::{line_rows, ultrametric_violation};
///
/// // On a line, the outer pair is farther apart than either inner pair.
/// assert_eq!(ultrametric_violation(&line_rows(&[0.0, 1.0, 2.0])), Some((0, 2, 1)));
/// let flat = vec![vec![0.0, 1.0, 1.0], vec![1.0, 0.0, 1.0], vec![1.0, 1.0, 0.0]];
/// assert_eq!(ultrametric_violation(&flat), None);
/// ```
#[must_use]
pub fn ultrametric_violation<R: AsRef<[f64]>>(rows: &[R]) -> Option<(usize, usize, usize)> {
    let size = rows.len();
    let at = |i: usize, j: usize| rows.get(i).and_then(|row| row.as_ref().get(j)).copied();
    let exceeds = |i: usize, j: usize, k: usize| {
        matches!(
            (at(i, j), at(i, k), at(k, j)),
            (Some(ij), Some(ik), Some(kj)) if ij > ik.max(kj)
        )
    };
    (0..size)
        .flat_map(|i| (i + 1..size).map(move |j| (i, j)))
        .flat_map(|(i, j)| (0..size).map(move |k| (i, j, k)))
        .find(|&(i, j, k)| k != i && k != j && exceeds(i, j, k))
}

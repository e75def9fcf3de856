//! Unit tests for dissimilarity matrices.

use rstest::{fixture, rstest};

use super::{DissimilarityError, DissimilarityMatrix, condensed_index, condensed_len};
use crate::Linkage;

#[fixture]
fn four_items() -> DissimilarityMatrix {
    DissimilarityMatrix::from_rows(&[
        [0.0, 1.0, 4.0, 6.0],
        [1.0, 0.0, 2.0, 8.0],
        [4.0, 2.0, 0.0, 3.0],
        [6.0, 8.0, 3.0, 0.0],
    ])
    .expect("matrix must be valid")
}

#[test]
fn condensed_layout_is_row_major_upper_triangle() {
    assert_eq!(condensed_len(0), 0);
    assert_eq!(condensed_len(1), 0);
    assert_eq!(condensed_len(4), 6);
    let positions: Vec<usize> = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]
        .iter()
        .map(|&(row, col)| condensed_index(4, row, col))
        .collect();
    assert_eq!(positions, vec![0, 1, 2, 3, 4, 5]);
}

#[rstest]
fn reads_values_symmetrically(four_items: DissimilarityMatrix) {
    assert_eq!(four_items.get(1, 3), Some(8.0));
    assert_eq!(four_items.get(3, 1), Some(8.0));
    assert_eq!(four_items.get(2, 2), Some(0.0));
    assert_eq!(four_items.get(4, 0), None);
    assert_eq!(four_items.condensed(), [1.0, 4.0, 6.0, 2.0, 8.0, 3.0]);
}

#[rstest]
fn round_trips_rows(four_items: DissimilarityMatrix) {
    let rows = four_items.to_rows();
    let rebuilt = DissimilarityMatrix::from_rows(&rows).expect("rows must be valid");
    assert_eq!(rebuilt, four_items);
}

#[rstest]
#[case::ragged(vec![vec![0.0, 1.0], vec![1.0]], "DISSIMILARITY_NOT_SQUARE")]
#[case::negative(vec![vec![0.0, -1.0], vec![-1.0, 0.0]], "DISSIMILARITY_INVALID_VALUE")]
#[case::nan(vec![vec![0.0, f64::NAN], vec![f64::NAN, 0.0]], "DISSIMILARITY_INVALID_VALUE")]
#[case::diagonal(vec![vec![1.0, 1.0], vec![1.0, 0.0]], "DISSIMILARITY_NON_ZERO_DIAGONAL")]
#[case::asymmetric(vec![vec![0.0, 1.0], vec![2.0, 0.0]], "DISSIMILARITY_ASYMMETRIC")]
fn rejects_invalid_rows(#[case] rows: Vec<Vec<f64>>, #[case] code: &str) {
    let err = DissimilarityMatrix::from_rows(&rows).expect_err("rows must be rejected");
    assert_eq!(err.code().as_str(), code);
}

#[test]
fn rejects_condensed_buffers_of_the_wrong_length() {
    let err = DissimilarityMatrix::from_condensed(3, vec![1.0, 2.0])
        .expect_err("length must be rejected");
    assert_eq!(
        err,
        DissimilarityError::CondensedLength {
            size: 3,
            expected: 3,
            got: 2
        }
    );
}

#[test]
fn rejects_invalid_condensed_values() {
    let err = DissimilarityMatrix::from_condensed(3, vec![1.0, f64::INFINITY, 2.0])
        .expect_err("infinite entries must be rejected");
    assert!(matches!(
        err,
        DissimilarityError::InvalidValue { row: 0, col: 2, .. }
    ));
}

#[rstest]
fn chunks_list_levels_in_ascending_order(four_items: DissimilarityMatrix) {
    let distances: Vec<f64> = four_items
        .chunks_ascending()
        .iter()
        .map(super::Chunk::distance)
        .collect();
    assert_eq!(distances, vec![1.0, 2.0, 3.0, 4.0, 6.0, 8.0]);
}

#[rstest]
#[case::single(Linkage::Single, [2.0, 6.0, 3.0])]
#[case::complete(Linkage::Complete, [4.0, 8.0, 3.0])]
#[case::average(Linkage::Average, [3.0, 7.0, 3.0])]
fn merging_keeps_lower_index_and_shifts_the_rest(
    four_items: DissimilarityMatrix,
    #[case] linkage: Linkage,
    #[case] expected: [f64; 3],
) {
    // Merge {0, 1}: the union sits at index 0, items 2 and 3 become 1 and 2.
    let sizes = [1, 1, 1, 1];
    let merged = four_items
        .merged_via(&linkage.rule(&sizes), 1, 0)
        .expect("merge must succeed");
    assert_eq!(merged.size(), 3);
    assert_eq!(merged.condensed(), expected);
}

#[rstest]
fn merging_the_last_index_leaves_the_prefix_untouched(four_items: DissimilarityMatrix) {
    let sizes = [1, 1, 1, 1];
    let merged = four_items
        .merged_via(&Linkage::Single.rule(&sizes), 2, 3)
        .expect("merge must succeed");
    // {2, 3} at index 2: d(0, {2,3}) = min(4, 6), d(1, {2,3}) = min(2, 8).
    assert_eq!(merged.condensed(), [1.0, 4.0, 2.0]);
    assert_eq!(four_items.size(), 4, "the source matrix is never mutated");
}

#[rstest]
#[case(0, 0, "DISSIMILARITY_SELF_MERGE")]
#[case(0, 4, "DISSIMILARITY_INDEX_OUT_OF_RANGE")]
fn merging_rejects_invalid_pairs(
    four_items: DissimilarityMatrix,
    #[case] a: usize,
    #[case] b: usize,
    #[case] code: &str,
) {
    let sizes = [1, 1, 1, 1];
    let err = four_items
        .merged_via(&Linkage::Single.rule(&sizes), a, b)
        .expect_err("pair must be rejected");
    assert_eq!(err.code().as_str(), code);
}

#[rstest]
fn subtraction_requires_equal_sizes(four_items: DissimilarityMatrix) {
    let small = DissimilarityMatrix::from_condensed(2, vec![1.0]).expect("valid matrix");
    let err = four_items.minus(&small).expect_err("sizes differ");
    assert_eq!(err, DissimilarityError::SizeMismatch { left: 4, right: 2 });

    let zero = four_items.minus(&four_items).expect("sizes match");
    assert!(zero.condensed().iter().all(|value| *value == 0.0));
}

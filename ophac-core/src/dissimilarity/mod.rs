//! Dissimilarity matrices consumed and produced by the search.
//!
//! Matrices are symmetric with a zero diagonal, so only the strict upper
//! triangle is stored, row-major. A matrix is an immutable value: merging two
//! clusters produces a new, one-smaller matrix and leaves the original
//! untouched for sibling branches of the search.
//!
//! Merges follow one index convention shared with [`crate::Quiver`] and
//! [`crate::Partition`]: the merged cluster takes the smaller index, the larger
//! index is removed, and every index above it shifts down by one.

mod chunks;
mod norm;

use thiserror::Error;

use crate::{error::define_error_codes, linkage::LinkageRule};

pub use self::chunks::Chunk;
pub use self::norm::{NormOrder, Residual};

pub(crate) use self::chunks::indistinguishable;

/// Errors raised while building or transforming a [`DissimilarityMatrix`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DissimilarityError {
    /// A row did not have one entry per item.
    #[error("row {row} has {len} entries but the matrix has {expected} rows")]
    NotSquare {
        /// Offending row.
        row: usize,
        /// Number of entries in the row.
        len: usize,
        /// Number of rows in the matrix.
        expected: usize,
    },
    /// An entry was negative, NaN or infinite.
    #[error("entry ({row}, {col}) must be finite and non-negative (got {value})")]
    InvalidValue {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
        /// Offending value.
        value: f64,
    },
    /// A diagonal entry was not zero.
    #[error("diagonal entry {index} must be zero (got {value})")]
    NonZeroDiagonal {
        /// Index of the offending diagonal entry.
        index: usize,
        /// Offending value.
        value: f64,
    },
    /// The matrix was not symmetric.
    #[error("entry ({row}, {col}) = {upper} differs from its mirror {lower}")]
    Asymmetric {
        /// Row of the upper-triangle entry.
        row: usize,
        /// Column of the upper-triangle entry.
        col: usize,
        /// Upper-triangle value.
        upper: f64,
        /// Lower-triangle value.
        lower: f64,
    },
    /// A condensed buffer had the wrong length for the requested size.
    #[error("a condensed matrix of size {size} needs {expected} entries (got {got})")]
    CondensedLength {
        /// Requested matrix size.
        size: usize,
        /// Required number of entries.
        expected: usize,
        /// Supplied number of entries.
        got: usize,
    },
    /// A cluster index was outside the matrix.
    #[error("index {index} is out of range for a matrix of size {size}")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Matrix size.
        size: usize,
    },
    /// A cluster was asked to merge with itself.
    #[error("cannot merge cluster {index} with itself")]
    SelfMerge {
        /// Offending index.
        index: usize,
    },
    /// Two matrices of different sizes were combined.
    #[error("matrix sizes differ: left={left}, right={right}")]
    SizeMismatch {
        /// Size of the left operand.
        left: usize,
        /// Size of the right operand.
        right: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`DissimilarityError`] variants.
    enum DissimilarityErrorCode for DissimilarityError {
        /// A row did not have one entry per item.
        NotSquare => DissimilarityError::NotSquare { .. } => "DISSIMILARITY_NOT_SQUARE",
        /// An entry was negative, NaN or infinite.
        InvalidValue => DissimilarityError::InvalidValue { .. } => "DISSIMILARITY_INVALID_VALUE",
        /// A diagonal entry was not zero.
        NonZeroDiagonal => DissimilarityError::NonZeroDiagonal { .. } => "DISSIMILARITY_NON_ZERO_DIAGONAL",
        /// The matrix was not symmetric.
        Asymmetric => DissimilarityError::Asymmetric { .. } => "DISSIMILARITY_ASYMMETRIC",
        /// A condensed buffer had the wrong length.
        CondensedLength => DissimilarityError::CondensedLength { .. } => "DISSIMILARITY_CONDENSED_LENGTH",
        /// A cluster index was outside the matrix.
        IndexOutOfRange => DissimilarityError::IndexOutOfRange { .. } => "DISSIMILARITY_INDEX_OUT_OF_RANGE",
        /// A cluster was asked to merge with itself.
        SelfMerge => DissimilarityError::SelfMerge { .. } => "DISSIMILARITY_SELF_MERGE",
        /// Two matrices of different sizes were combined.
        SizeMismatch => DissimilarityError::SizeMismatch { .. } => "DISSIMILARITY_SIZE_MISMATCH",
    }
}

/// Symmetric, zero-diagonal matrix of finite non-negative dissimilarities.
///
/// # Examples
/// ```
/// use ophac_core::DissimilarityMatrix;
///
/// let matrix = DissimilarityMatrix::from_rows(&[
///     [0.0, 1.0, 2.0],
///     [1.0, 0.0, 2.0],
///     [2.0, 2.0, 0.0],
/// ])?;
/// assert_eq!(matrix.size(), 3);
/// assert_eq!(matrix.get(2, 0), Some(2.0));
/// assert_eq!(matrix.condensed(), [1.0, 2.0, 2.0]);
/// # Ok::<(), ophac_core::DissimilarityError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DissimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DissimilarityMatrix {
    /// Builds a matrix from full rows, validating shape and contents.
    ///
    /// # Errors
    /// Returns [`DissimilarityError::NotSquare`] for ragged or non-square
    /// input, [`DissimilarityError::InvalidValue`] for negative or non-finite
    /// entries, [`DissimilarityError::NonZeroDiagonal`] and
    /// [`DissimilarityError::Asymmetric`] when the matrix is not a valid
    /// dissimilarity.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, DissimilarityError> {
        let size = rows.len();
        for (row, raw) in rows.iter().enumerate() {
            let entries = raw.as_ref();
            if entries.len() != size {
                return Err(DissimilarityError::NotSquare {
                    row,
                    len: entries.len(),
                    expected: size,
                });
            }
            for (col, &value) in entries.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(DissimilarityError::InvalidValue { row, col, value });
                }
            }
        }

        let mut values = Vec::with_capacity(condensed_len(size));
        for (row, raw) in rows.iter().enumerate() {
            let entries = raw.as_ref();
            for ((col, &upper), mirror_row) in entries.iter().enumerate().zip(rows).skip(row) {
                if col == row {
                    if upper != 0.0 {
                        return Err(DissimilarityError::NonZeroDiagonal {
                            index: row,
                            value: upper,
                        });
                    }
                    continue;
                }
                let mirror = mirror_row.as_ref();
                let Some(&lower) = mirror.get(row) else {
                    return Err(DissimilarityError::NotSquare {
                        row: col,
                        len: mirror.len(),
                        expected: size,
                    });
                };
                if upper != lower {
                    return Err(DissimilarityError::Asymmetric {
                        row,
                        col,
                        upper,
                        lower,
                    });
                }
                values.push(upper);
            }
        }

        Ok(Self { size, values })
    }

    /// Builds a matrix of `size` items from its condensed upper triangle
    /// (row-major, diagonal excluded).
    ///
    /// # Errors
    /// Returns [`DissimilarityError::CondensedLength`] when `values` does not
    /// hold `size * (size - 1) / 2` entries and
    /// [`DissimilarityError::InvalidValue`] for negative or non-finite
    /// entries.
    pub fn from_condensed(size: usize, values: Vec<f64>) -> Result<Self, DissimilarityError> {
        let expected = condensed_len(size);
        if values.len() != expected {
            return Err(DissimilarityError::CondensedLength {
                size,
                expected,
                got: values.len(),
            });
        }
        let matrix = Self { size, values };
        if let Some((row, col, value)) = matrix
            .pairs()
            .find(|&(_, _, value)| !value.is_finite() || value < 0.0)
        {
            return Err(DissimilarityError::InvalidValue { row, col, value });
        }
        Ok(matrix)
    }

    /// Builds a matrix without validation. Callers guarantee the invariants.
    pub(crate) fn from_condensed_unchecked(size: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), condensed_len(size));
        Self { size, values }
    }

    /// Returns the number of items.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the dissimilarity between `i` and `j`, or `None` when either
    /// index is out of range.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.size || j >= self.size {
            return None;
        }
        if i == j {
            return Some(0.0);
        }
        let (row, col) = (i.min(j), i.max(j));
        self.values.get(condensed_index(self.size, row, col)).copied()
    }

    /// Returns the condensed upper triangle, row-major.
    #[must_use]
    pub fn condensed(&self) -> &[f64] {
        &self.values
    }

    /// Expands the matrix into full rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.size)
            .map(|i| (0..self.size).filter_map(|j| self.get(i, j)).collect())
            .collect()
    }

    /// Iterates over `(i, j, value)` for every pair with `i < j`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let size = self.size;
        (0..size)
            .flat_map(move |i| ((i + 1)..size).map(move |j| (i, j)))
            .zip(self.values.iter().copied())
            .map(|((i, j), value)| (i, j, value))
    }

    /// Groups all pairs into chunks of tied dissimilarities, least
    /// dissimilar first.
    ///
    /// # Examples
    /// ```
    /// use ophac_core::DissimilarityMatrix;
    ///
    /// let matrix = DissimilarityMatrix::from_condensed(3, vec![1.0, 2.0, 2.0])?;
    /// let chunks = matrix.chunks_ascending();
    /// assert_eq!(chunks.len(), 2);
    /// assert_eq!(chunks[0].distance(), 1.0);
    /// assert_eq!(chunks[1].pairs(), [(0, 2), (1, 2)]);
    /// # Ok::<(), ophac_core::DissimilarityError>(())
    /// ```
    #[must_use]
    pub fn chunks_ascending(&self) -> Vec<Chunk> {
        chunks::group_ascending(self.pairs())
    }

    /// Merges clusters `a` and `b` under `rule`, producing a matrix one item
    /// smaller.
    ///
    /// # Errors
    /// Returns [`DissimilarityError::IndexOutOfRange`] when either index is
    /// outside the matrix and [`DissimilarityError::SelfMerge`] when
    /// `a == b`.
    pub fn merged_via(
        &self,
        rule: &LinkageRule<'_>,
        a: usize,
        b: usize,
    ) -> Result<Self, DissimilarityError> {
        let (lo, hi) = self.merge_indices(a, b)?;
        let size = self.size - 1;
        let original = |index: usize| if index < hi { index } else { index + 1 };
        let at = |i: usize, j: usize| {
            self.get(i, j)
                .ok_or_else(|| DissimilarityError::IndexOutOfRange {
                    index: i.max(j),
                    size: self.size,
                })
        };

        let mut values = Vec::with_capacity(condensed_len(size));
        for i in 0..size {
            for j in (i + 1)..size {
                let value = if i == lo || j == lo {
                    let other = original(if i == lo { j } else { i });
                    rule.merged_distance(lo, hi, at(lo, other)?, at(hi, other)?)
                } else {
                    at(original(i), original(j))?
                };
                values.push(value);
            }
        }

        Ok(Self::from_condensed_unchecked(size, values))
    }

    /// Subtracts `other` entrywise.
    ///
    /// # Errors
    /// Returns [`DissimilarityError::SizeMismatch`] when the matrices differ
    /// in size.
    #[expect(
        clippy::float_arithmetic,
        reason = "residuals are entrywise differences"
    )]
    pub fn minus(&self, other: &Self) -> Result<Residual, DissimilarityError> {
        if self.size != other.size {
            return Err(DissimilarityError::SizeMismatch {
                left: self.size,
                right: other.size,
            });
        }
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(left, right)| left - right)
            .collect();
        Ok(Residual::new(self.size, values))
    }

    /// Computes the entrywise norm of the upper triangle.
    #[must_use]
    pub fn norm(&self, order: NormOrder) -> f64 {
        order.apply(&self.values)
    }

    fn merge_indices(&self, a: usize, b: usize) -> Result<(usize, usize), DissimilarityError> {
        for index in [a, b] {
            if index >= self.size {
                return Err(DissimilarityError::IndexOutOfRange {
                    index,
                    size: self.size,
                });
            }
        }
        if a == b {
            return Err(DissimilarityError::SelfMerge { index: a });
        }
        Ok((a.min(b), a.max(b)))
    }
}

/// Number of strict upper-triangle entries of a `size`-item matrix.
#[expect(
    clippy::integer_division,
    clippy::integer_division_remainder_used,
    reason = "n(n - 1) is always even"
)]
pub(crate) const fn condensed_len(size: usize) -> usize {
    size * size.saturating_sub(1) / 2
}

/// Position of `(row, col)`, `row < col`, in the condensed buffer.
#[expect(
    clippy::integer_division,
    clippy::integer_division_remainder_used,
    reason = "r(r + 1) is always even"
)]
pub(crate) const fn condensed_index(size: usize, row: usize, col: usize) -> usize {
    row * size - row * (row + 1) / 2 + (col - row - 1)
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests require contextual panics")]
mod tests;

//! Entrywise matrix norms used to score candidate dendrograms.

use crate::error::OphacError;

/// Order `p` of an entrywise `p`-norm over the strict upper triangle.
///
/// # Examples
/// ```
/// use ophac_core::NormOrder;
///
/// assert_eq!(NormOrder::new(1.0)?, NormOrder::default());
/// assert_eq!(NormOrder::new(f64::INFINITY)?, NormOrder::Infinity);
/// assert!(NormOrder::new(0.5).is_err());
/// # Ok::<(), ophac_core::OphacError>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NormOrder {
    /// `(Σ |x|^p)^(1/p)` for a finite `p >= 1`.
    Finite(f64),
    /// `max |x|`.
    Infinity,
}

impl Default for NormOrder {
    fn default() -> Self {
        Self::Finite(1.0)
    }
}

impl NormOrder {
    /// Validates a raw norm order.
    ///
    /// # Errors
    /// Returns [`OphacError::InvalidNormOrder`] when `p` is NaN or below one.
    pub const fn new(p: f64) -> Result<Self, OphacError> {
        if p == f64::INFINITY {
            Ok(Self::Infinity)
        } else if p.is_finite() && p >= 1.0 {
            Ok(Self::Finite(p))
        } else {
            Err(OphacError::InvalidNormOrder { got: p })
        }
    }

    /// Returns the raw order, `f64::INFINITY` for the max norm.
    #[must_use]
    pub const fn get(self) -> f64 {
        match self {
            Self::Finite(p) => p,
            Self::Infinity => f64::INFINITY,
        }
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "p-norms square and sum the entries"
    )]
    pub(crate) fn apply(self, values: &[f64]) -> f64 {
        match self {
            Self::Infinity => values.iter().fold(0.0, |acc, value| acc.max(value.abs())),
            Self::Finite(p) if p == 1.0 => values.iter().map(|value| value.abs()).sum(),
            Self::Finite(p) if p == 2.0 => values
                .iter()
                .map(|value| value * value)
                .sum::<f64>()
                .sqrt(),
            Self::Finite(p) => values
                .iter()
                .map(|value| value.abs().powf(p))
                .sum::<f64>()
                .powf(p.recip()),
        }
    }
}

/// Entrywise difference of two dissimilarity matrices.
///
/// Entries may be negative, so a residual is not itself a dissimilarity.
#[derive(Clone, Debug, PartialEq)]
pub struct Residual {
    size: usize,
    values: Vec<f64>,
}

impl Residual {
    pub(super) const fn new(size: usize, values: Vec<f64>) -> Self {
        Self { size, values }
    }

    /// Returns the number of items of the matrices that were subtracted.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the condensed upper-triangle differences.
    #[must_use]
    pub fn condensed(&self) -> &[f64] {
        &self.values
    }

    /// Computes the entrywise norm of the residual.
    ///
    /// # Examples
    /// ```
    /// use ophac_core::{DissimilarityMatrix, NormOrder};
    ///
    /// let left = DissimilarityMatrix::from_condensed(3, vec![1.0, 4.0, 2.0])?;
    /// let right = DissimilarityMatrix::from_condensed(3, vec![1.0, 1.0, 6.0])?;
    /// let residual = left.minus(&right)?;
    /// assert_eq!(residual.norm(NormOrder::default()), 7.0);
    /// assert_eq!(residual.norm(NormOrder::Infinity), 4.0);
    /// # Ok::<(), ophac_core::DissimilarityError>(())
    /// ```
    #[must_use]
    pub fn norm(&self, order: NormOrder) -> f64 {
        order.apply(&self.values)
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests require contextual panics")]
#[expect(
    clippy::float_arithmetic,
    reason = "closed-form norms are compared within a tolerance"
)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(NormOrder::Finite(1.0), 7.0)]
    #[case(NormOrder::Finite(2.0), 5.0)]
    #[case(NormOrder::Infinity, 4.0)]
    fn applies_each_order(#[case] order: NormOrder, #[case] expected: f64) {
        let values = [3.0, -4.0, 0.0];
        assert_eq!(order.apply(&values), expected);
    }

    #[test]
    fn general_order_matches_closed_form() {
        let values = [1.0, -1.0];
        let norm = NormOrder::Finite(3.0).apply(&values);
        assert!((norm - 2.0_f64.powf(1.0 / 3.0)).abs() < 1e-12);
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.999)]
    #[case(f64::NAN)]
    #[case(f64::NEG_INFINITY)]
    fn rejects_invalid_orders(#[case] p: f64) {
        let err = NormOrder::new(p).expect_err("order must be rejected");
        assert!(matches!(err, OphacError::InvalidNormOrder { .. }));
    }

    #[test]
    fn empty_residual_has_zero_norm() {
        let residual = Residual::new(1, Vec::new());
        assert_eq!(residual.norm(NormOrder::default()), 0.0);
        assert_eq!(residual.norm(NormOrder::Infinity), 0.0);
    }
}

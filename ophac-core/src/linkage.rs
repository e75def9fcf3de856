//! Linkage rules used to update dissimilarities after a merge.
//!
//! A [`Linkage`] is chosen once per engine. At every merge it is
//! re-parameterised with the live cluster sizes through [`Linkage::rule`],
//! because average linkage weights each side by the size it has at the moment
//! of the merge.

use core::{fmt, str::FromStr};
use std::sync::Arc;

use crate::error::OphacError;

/// Linkage method applied when two clusters merge.
///
/// # Examples
/// ```
/// use ophac_core::Linkage;
///
/// let linkage: Linkage = " Average ".parse().expect("known linkage");
/// assert_eq!(linkage, Linkage::Average);
/// assert_eq!(linkage.to_string(), "average");
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Linkage {
    /// Distance to the merged cluster is the minimum of the two sides.
    Single,
    /// Distance to the merged cluster is the maximum of the two sides.
    Complete,
    /// Distance to the merged cluster is the size-weighted mean of the two sides.
    Average,
}

impl Linkage {
    /// Returns the canonical lower-case name of the linkage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Complete => "complete",
            Self::Average => "average",
        }
    }

    /// Binds the linkage to the current cluster sizes.
    ///
    /// `sizes[i]` must be the number of original items in live cluster `i`.
    #[must_use]
    pub const fn rule(self, sizes: &[usize]) -> LinkageRule<'_> {
        LinkageRule {
            linkage: self,
            sizes,
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Linkage {
    type Err = OphacError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "complete" => Ok(Self::Complete),
            "average" => Ok(Self::Average),
            _ => Err(OphacError::UnknownLinkage {
                name: Arc::from(raw),
            }),
        }
    }
}

/// A linkage bound to the cluster sizes of one search state.
#[derive(Clone, Copy, Debug)]
pub struct LinkageRule<'a> {
    linkage: Linkage,
    sizes: &'a [usize],
}

impl LinkageRule<'_> {
    /// Returns the underlying linkage.
    #[must_use]
    pub const fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Computes the dissimilarity between the union of clusters `a` and `b`
    /// and some other cluster, given that cluster's dissimilarity to `a`
    /// (`to_a`) and to `b` (`to_b`).
    ///
    /// For average linkage, `a` and `b` must index the bound sizes.
    ///
    /// # Examples
    /// ```
    /// use ophac_core::Linkage;
    ///
    /// let sizes = [2, 1];
    /// let rule = Linkage::Average.rule(&sizes);
    /// assert_eq!(rule.merged_distance(0, 1, 2.0, 5.0), 3.0);
    /// assert_eq!(Linkage::Single.rule(&sizes).merged_distance(0, 1, 2.0, 5.0), 2.0);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "average linkage is a size-weighted mean"
    )]
    pub fn merged_distance(&self, a: usize, b: usize, to_a: f64, to_b: f64) -> f64 {
        match self.linkage {
            Linkage::Single => to_a.min(to_b),
            Linkage::Complete => to_a.max(to_b),
            Linkage::Average => {
                let weight_a = self.size_of(a);
                let weight_b = self.size_of(b);
                (weight_a * to_a + weight_b * to_b) / (weight_a + weight_b)
            }
        }
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "cluster sizes stay far below 2^52"
    )]
    fn size_of(&self, cluster: usize) -> f64 {
        debug_assert!(
            cluster < self.sizes.len(),
            "cluster {cluster} has no bound size (sizes cover {} clusters)",
            self.sizes.len()
        );
        self.sizes.get(cluster).copied().unwrap_or(1) as f64
    }
}

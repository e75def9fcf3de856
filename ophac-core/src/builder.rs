//! Builder utilities for configuring the ophac engine.
//!
//! Collects the linkage name, norm order and tie-break increment, and
//! validates them before constructing an [`Engine`].

use crate::{
    Result,
    dissimilarity::NormOrder,
    engine::Engine,
    error::OphacError,
    linkage::Linkage,
};

/// Norm order used when none is configured.
pub const DEFAULT_NORM_ORDER: f64 = 1.0;

/// Tie-break increment used when none is configured.
pub const DEFAULT_TIE_BREAK: f64 = 1e-12;

/// Linkage name used when none is configured.
pub const DEFAULT_LINKAGE: &str = "single";

/// Configures and constructs [`Engine`] instances.
///
/// # Examples
/// ```
/// use ophac_core::{EngineBuilder, Linkage};
///
/// let engine = EngineBuilder::new()
///     .with_linkage_name("complete")
///     .with_norm_order(2.0)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(engine.linkage(), Linkage::Complete);
/// assert_eq!(engine.norm_order().get(), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    linkage_name: String,
    norm_order: f64,
    tie_break: f64,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            linkage_name: DEFAULT_LINKAGE.to_owned(),
            norm_order: DEFAULT_NORM_ORDER,
            tie_break: DEFAULT_TIE_BREAK,
        }
    }
}

impl EngineBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use ophac_core::EngineBuilder;
    ///
    /// let builder = EngineBuilder::new();
    /// assert_eq!(builder.linkage_name(), "single");
    /// assert_eq!(builder.norm_order(), 1.0);
    /// assert_eq!(builder.tie_break(), 1e-12);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the linkage rule by name: `single`, `complete` or `average`.
    ///
    /// The name is validated by [`Self::build`].
    #[must_use]
    pub fn with_linkage_name(mut self, name: impl Into<String>) -> Self {
        self.linkage_name = name.into();
        self
    }

    /// Sets the linkage rule directly.
    #[must_use]
    pub fn with_linkage(self, linkage: Linkage) -> Self {
        self.with_linkage_name(linkage.as_str())
    }

    /// Returns the configured linkage name.
    #[must_use]
    pub fn linkage_name(&self) -> &str {
        &self.linkage_name
    }

    /// Sets the order of the matrix norm used for scoring; `f64::INFINITY`
    /// selects the max norm.
    #[must_use]
    pub const fn with_norm_order(mut self, order: f64) -> Self {
        self.norm_order = order;
        self
    }

    /// Returns the configured norm order.
    #[must_use]
    pub const fn norm_order(&self) -> f64 {
        self.norm_order
    }

    /// Sets the tie-break increment applied to heights during scoring.
    #[must_use]
    pub const fn with_tie_break(mut self, increment: f64) -> Self {
        self.tie_break = increment;
        self
    }

    /// Returns the configured tie-break increment.
    #[must_use]
    pub const fn tie_break(&self) -> f64 {
        self.tie_break
    }

    /// Validates the configuration and constructs an [`Engine`].
    ///
    /// # Errors
    /// Returns [`OphacError::UnknownLinkage`] for an unrecognised linkage
    /// name, [`OphacError::InvalidNormOrder`] for a norm order below one or
    /// NaN, and [`OphacError::InvalidTieBreak`] for a negative or non-finite
    /// increment.
    ///
    /// # Examples
    /// ```
    /// use ophac_core::{EngineBuilder, OphacError};
    ///
    /// let err = EngineBuilder::new()
    ///     .with_linkage_name("ward")
    ///     .build()
    ///     .expect_err("ward is not supported");
    /// assert!(matches!(err, OphacError::UnknownLinkage { .. }));
    /// ```
    pub fn build(self) -> Result<Engine> {
        let linkage: Linkage = self.linkage_name.parse()?;
        let norm_order = NormOrder::new(self.norm_order)?;
        if !self.tie_break.is_finite() || self.tie_break < 0.0 {
            return Err(OphacError::InvalidTieBreak {
                got: self.tie_break,
            });
        }
        Ok(Engine::from_parts(linkage, norm_order, self.tie_break))
    }
}

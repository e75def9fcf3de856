//! Error types for the ophac core library.
//!
//! Defines the engine-level error enum, the stable error-code machinery shared
//! by every collaborator error, and a convenient result alias.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    dendrogram::DendrogramError, dissimilarity::DissimilarityError, partition::PartitionError,
    quiver::QuiverError,
};

/// Generates a stable, machine-readable code enum for an error type.
///
/// Each line maps a code variant to a pattern over the error type and the
/// string emitted by `as_str`.
macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $pattern:pat => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl ::core::fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $($pattern => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

pub(crate) use define_error_codes;

/// Error type produced when configuring or running [`crate::Engine`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum OphacError {
    /// The linkage rule name is not one of `single`, `complete` or `average`.
    #[error("unknown linkage rule `{name}`; expected `single`, `complete` or `average`")]
    UnknownLinkage {
        /// Name supplied by the caller.
        name: Arc<str>,
    },
    /// The matrix-norm order must be a finite value of at least one, or infinity.
    #[error("norm order must be >= 1 or infinite (got {got})")]
    InvalidNormOrder {
        /// Order supplied by the caller.
        got: f64,
    },
    /// The tie-break increment must be finite and non-negative.
    #[error("tie-break increment must be finite and non-negative (got {got})")]
    InvalidTieBreak {
        /// Increment supplied by the caller.
        got: f64,
    },
    /// The dissimilarity matrix contained no items.
    #[error("cannot generate dendrograms for an empty dissimilarity matrix")]
    EmptyDissimilarity,
    /// The order constraint does not cover the same items as the matrix.
    #[error("order constraint has {nodes} nodes but the dissimilarity matrix has {items} items")]
    OrderSizeMismatch {
        /// Number of items in the dissimilarity matrix.
        items: usize,
        /// Number of nodes in the order constraint.
        nodes: usize,
    },
    /// A merge was appended below the height of the previous merge.
    #[error("merge {step} at height {height} is below the previous height {previous}")]
    NonMonotoneMerge {
        /// Zero-based position of the offending merge in its dendrogram.
        step: usize,
        /// Height of the preceding merge.
        previous: f64,
        /// Height of the offending merge.
        height: f64,
    },
    /// A level with a mergeable pair was selected but produced no branch.
    #[error("no branch was taken at dissimilarity level {distance}")]
    NoBranchTaken {
        /// Dissimilarity of the selected level.
        distance: f64,
    },
    /// A dissimilarity-matrix operation failed.
    #[error(transparent)]
    Dissimilarity(#[from] DissimilarityError),
    /// An order-constraint operation failed.
    #[error(transparent)]
    Quiver(#[from] QuiverError),
    /// A partition operation failed.
    #[error(transparent)]
    Partition(#[from] PartitionError),
    /// A dendrogram could not be replayed.
    #[error(transparent)]
    Dendrogram(#[from] DendrogramError),
}

define_error_codes! {
    /// Stable codes describing [`OphacError`] variants.
    enum OphacErrorCode for OphacError {
        /// The linkage rule name is not recognised.
        UnknownLinkage => OphacError::UnknownLinkage { .. } => "OPHAC_UNKNOWN_LINKAGE",
        /// The matrix-norm order is invalid.
        InvalidNormOrder => OphacError::InvalidNormOrder { .. } => "OPHAC_INVALID_NORM_ORDER",
        /// The tie-break increment is invalid.
        InvalidTieBreak => OphacError::InvalidTieBreak { .. } => "OPHAC_INVALID_TIE_BREAK",
        /// The dissimilarity matrix contained no items.
        EmptyDissimilarity => OphacError::EmptyDissimilarity => "OPHAC_EMPTY_DISSIMILARITY",
        /// The order constraint and the matrix disagree on the item count.
        OrderSizeMismatch => OphacError::OrderSizeMismatch { .. } => "OPHAC_ORDER_SIZE_MISMATCH",
        /// A merge height decreased along a dendrogram.
        NonMonotoneMerge => OphacError::NonMonotoneMerge { .. } => "OPHAC_NON_MONOTONE_MERGE",
        /// A selected level produced no branch.
        NoBranchTaken => OphacError::NoBranchTaken { .. } => "OPHAC_NO_BRANCH_TAKEN",
        /// A dissimilarity-matrix operation failed.
        Dissimilarity => OphacError::Dissimilarity(_) => "OPHAC_DISSIMILARITY_FAILURE",
        /// An order-constraint operation failed.
        Quiver => OphacError::Quiver(_) => "OPHAC_QUIVER_FAILURE",
        /// A partition operation failed.
        Partition => OphacError::Partition(_) => "OPHAC_PARTITION_FAILURE",
        /// A dendrogram could not be replayed.
        Dendrogram => OphacError::Dendrogram(_) => "OPHAC_DENDROGRAM_FAILURE",
    }
}

impl OphacError {
    /// Returns `true` for errors that signal a broken internal invariant rather
    /// than invalid caller input.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::NonMonotoneMerge { .. } | Self::NoBranchTaken { .. }
        )
    }

    /// Retrieve the code of the collaborator error wrapped by this error, if any.
    #[must_use]
    pub const fn collaborator_code(&self) -> Option<&'static str> {
        match self {
            Self::Dissimilarity(error) => Some(error.code().as_str()),
            Self::Quiver(error) => Some(error.code().as_str()),
            Self::Partition(error) => Some(error.code().as_str()),
            Self::Dendrogram(error) => Some(error.code().as_str()),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, OphacError>;

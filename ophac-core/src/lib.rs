//! Ophac core library.
//!
//! Generates every optimal order-preserving hierarchical agglomerative
//! clustering of a dissimilarity matrix whose items carry a strict partial
//! order. The [`Engine`] explores all merge orders over tied dissimilarity
//! levels, drops topological duplicates, and keeps the dendrograms whose
//! ultrametrics lie closest to the input.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod dendrogram;
mod dissimilarity;
mod engine;
mod error;
mod linkage;
mod partition;
mod quiver;
mod search;

pub use crate::{
    builder::{DEFAULT_LINKAGE, DEFAULT_NORM_ORDER, DEFAULT_TIE_BREAK, EngineBuilder},
    dendrogram::{Dendrogram, DendrogramError, DendrogramErrorCode, Merge},
    dissimilarity::{
        Chunk, DissimilarityError, DissimilarityErrorCode, DissimilarityMatrix, NormOrder,
        Residual,
    },
    engine::Engine,
    error::{OphacError, OphacErrorCode, Result},
    linkage::{Linkage, LinkageRule},
    partition::{Partition, PartitionError, PartitionErrorCode},
    quiver::{Quiver, QuiverError, QuiverErrorCode},
    search::SearchOutcome,
};

//! Benchmark support crate for ophac.
//!
//! Provides seeded workloads and parameter types for the Criterion
//! benchmarks of the exhaustive search and its collaborators.

pub mod error;
pub mod params;
pub mod workload;

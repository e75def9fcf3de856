//! Shared test utilities used across ophac crates.
//!
//! - [`tracing`] captures spans and events so instrumentation can be asserted.
//! - [`property`] resolves the property-test run profile and provides input
//!   strategies.
//! - [`fixtures`] builds deterministic dissimilarity inputs and checks the
//!   ultrametric inequality.

pub mod fixtures;
pub mod property;
pub mod tracing;

//! geoexpect engine library.
//!
//! Exposes the distance metric, scoring model, grid-search optimizer,
//! heatmap sampler, message protocol, and executors for use by integration
//! tests, benchmarks, and the binary entry point.

pub mod config;
pub mod executor;
pub mod geo;
pub mod heatmap;
pub mod model;
pub mod parser;
pub mod protocol;
pub mod scoring;
pub mod search;
pub mod viewport;

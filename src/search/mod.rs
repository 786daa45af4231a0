//! Search for the location with the highest expected score.
//!
//! Only exhaustive grid search is provided; every lattice node is scored.

pub mod grid;

pub use grid::{
    find_best_expectation_point, find_best_expectation_point_sequential, SearchOptions,
};

//! Value types shared by the optimizer, the heatmap sampler, and the
//! message protocol.
//!
//! Every value here is created for a single request and dropped after it.
//! Field names serialize in camelCase so the JSON shapes match the wire
//! protocol exactly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A candidate point. The `id` is opaque to every computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Point {
            id: id.into(),
            lat,
            lng,
        }
    }
}

/// A bare coordinate pair as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Coordinate { lat, lng }
    }
}

/// An axis-aligned latitude/longitude box. Zero-span boxes are legal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        BoundingBox {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Returns the tightest box containing every point, or `None` when the
    /// slice is empty.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let seed = BoundingBox::new(first.lat, first.lat, first.lng, first.lng);
        Some(points[1..].iter().fold(seed, |acc, p| BoundingBox {
            min_lat: acc.min_lat.min(p.lat),
            max_lat: acc.max_lat.max(p.lat),
            min_lng: acc.min_lng.min(p.lng),
            max_lng: acc.max_lng.max(p.lng),
        }))
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

/// Lattice resolution used by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleCounts {
    pub samples_lat: usize,
    pub samples_lng: usize,
}

/// Default number of lattice nodes per axis.
pub const DEFAULT_SAMPLES: usize = 30;

impl SampleCounts {
    /// Creates sample counts, clamping each axis to at least one node.
    pub fn new(samples_lat: usize, samples_lng: usize) -> Self {
        SampleCounts {
            samples_lat: samples_lat.max(1),
            samples_lng: samples_lng.max(1),
        }
    }

    /// Returns a copy with both axes clamped to at least one node.
    pub fn clamped(self) -> Self {
        SampleCounts::new(self.samples_lat, self.samples_lng)
    }
}

impl Default for SampleCounts {
    fn default() -> Self {
        SampleCounts::new(DEFAULT_SAMPLES, DEFAULT_SAMPLES)
    }
}

/// Errors raised when a heatmap grid cannot be iterated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("invalid grid: {axis} step must be positive and finite, got {step}")]
    NonPositiveStep { axis: &'static str, step: f64 },

    #[error("invalid grid: {field} must be finite")]
    NonFiniteBound { field: &'static str },

    #[error("invalid grid: {axis} step {step} does not advance past {at}")]
    StepBelowPrecision {
        axis: &'static str,
        step: f64,
        at: f64,
    },

    #[error("invalid grid: about {nodes:.0} nodes exceeds the limit of {limit}")]
    TooManyNodes { nodes: f64, limit: usize },
}

/// An explicit min/max/step lattice for the heatmap sampler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSpec {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    pub step_lat: f64,
    pub step_lng: f64,
}

impl GridSpec {
    /// Checks that the grid terminates: both steps strictly positive and
    /// every bound finite.
    pub fn validate(&self) -> Result<(), GridError> {
        for (axis, step) in [("stepLat", self.step_lat), ("stepLng", self.step_lng)] {
            if !(step.is_finite() && step > 0.0) {
                return Err(GridError::NonPositiveStep { axis, step });
            }
        }
        for (field, value) in [
            ("minLat", self.min_lat),
            ("maxLat", self.max_lat),
            ("minLng", self.min_lng),
            ("maxLng", self.max_lng),
        ] {
            if !value.is_finite() {
                return Err(GridError::NonFiniteBound { field });
            }
        }
        Ok(())
    }
}

/// The best lattice node found by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectationResult {
    pub best_lat: f64,
    pub best_lng: f64,
    pub best_score: f64,
}

/// One evaluated heatmap node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapSample {
    pub lat: f64,
    pub lng: f64,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(step_lat: f64, step_lng: f64) -> GridSpec {
        GridSpec {
            min_lat: -1.0,
            max_lat: 1.0,
            min_lng: -1.0,
            max_lng: 1.0,
            step_lat,
            step_lng,
        }
    }

    #[test]
    fn enclosing_box_of_empty_set_is_none() {
        assert!(BoundingBox::enclosing(&[]).is_none());
    }

    #[test]
    fn enclosing_box_is_tight() {
        let points = vec![
            Point::new("a", 10.0, -5.0),
            Point::new("b", -3.0, 20.0),
            Point::new("c", 4.0, 0.0),
        ];
        let bbox = BoundingBox::enclosing(&points).unwrap();
        assert_eq!(bbox, BoundingBox::new(-3.0, 10.0, -5.0, 20.0));
        for p in &points {
            assert!(bbox.contains(p.lat, p.lng));
        }
    }

    #[test]
    fn enclosing_box_of_single_point_is_degenerate() {
        let bbox = BoundingBox::enclosing(&[Point::new("solo", 35.0, 135.0)]).unwrap();
        assert_eq!(bbox.min_lat, bbox.max_lat);
        assert_eq!(bbox.min_lng, bbox.max_lng);
    }

    #[test]
    fn sample_counts_clamp_to_one() {
        let counts = SampleCounts::new(0, 0);
        assert_eq!(counts.samples_lat, 1);
        assert_eq!(counts.samples_lng, 1);
        assert_eq!(SampleCounts::default(), SampleCounts::new(30, 30));
    }

    #[test]
    fn grid_validation() {
        assert!(grid(1.0, 0.5).validate().is_ok());
        assert_eq!(
            grid(0.0, 1.0).validate(),
            Err(GridError::NonPositiveStep {
                axis: "stepLat",
                step: 0.0
            })
        );
        assert!(grid(1.0, -0.1).validate().is_err());
        assert!(grid(f64::NAN, 1.0).validate().is_err());
        assert!(grid(f64::INFINITY, 1.0).validate().is_err());

        let mut open = grid(1.0, 1.0);
        open.max_lng = f64::INFINITY;
        assert_eq!(
            open.validate(),
            Err(GridError::NonFiniteBound { field: "maxLng" })
        );
    }

    #[test]
    fn grid_spec_uses_camel_case_on_the_wire() {
        let json = serde_json::to_value(grid(1.0, 2.0)).unwrap();
        assert_eq!(json["minLat"], -1.0);
        assert_eq!(json["stepLng"], 2.0);
    }

    #[test]
    fn expectation_result_uses_camel_case_on_the_wire() {
        let result = ExpectationResult {
            best_lat: 1.0,
            best_lng: 2.0,
            best_score: 3.0,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"bestLat":1.0,"bestLng":2.0,"bestScore":3.0}"#);
    }
}

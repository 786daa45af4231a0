//! Exponential-decay scoring model.
//!
//! A guess `d` kilometers away from a target scores `MAX_SCORE * exp(-k * d)`.
//! The expected score at a query location is the mean of that score over all
//! candidate points.

use crate::geo::distance_km;
use crate::model::Point;

/// Score awarded at zero distance.
pub const MAX_SCORE: f64 = 5000.0;

/// Converts a distance in kilometers into a score under decay rate `k`.
///
/// `k` is not validated. A negative `k` makes the score grow with distance.
pub fn score_from_distance(distance_km: f64, k: f64) -> f64 {
    MAX_SCORE * (-k * distance_km).exp()
}

/// Returns the mean score over `points` for a guess at `(lat, lng)`.
///
/// An empty candidate set scores 0.
pub fn expected_score_at(lat: f64, lng: f64, points: &[Point], k: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }

    let sum: f64 = points
        .iter()
        .map(|p| score_from_distance(distance_km(lat, lng, p.lat, p.lng), k))
        .sum();
    sum / points.len() as f64
}

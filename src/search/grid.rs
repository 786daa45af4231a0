//! Brute-force grid search for the expected-score maximum.
//!
//! Lays a uniform `samples_lat x samples_lng` lattice over a bounding box,
//! evaluates the expected score at every node, and keeps the best. There is
//! no pruning and no early exit.
//!
//! Ties go to the node visited first in row-major order (latitude ascending
//! in the outer loop, longitude ascending in the inner loop). Rows are scored
//! in parallel with rayon and merged back in row order under the same
//! strict comparison, so the result matches the sequential scan exactly.

use rayon::prelude::*;

use crate::model::{BoundingBox, ExpectationResult, Point, SampleCounts};
use crate::scoring::expected_score_at;

/// Search parameters for `find_best_expectation_point`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchOptions {
    /// Lattice resolution. Each axis is clamped to at least one node.
    pub samples: SampleCounts,
    /// Region to search. Defaults to the tight box around the points.
    pub bbox: Option<BoundingBox>,
}

impl SearchOptions {
    pub fn with_samples(samples_lat: usize, samples_lng: usize) -> Self {
        SearchOptions {
            samples: SampleCounts::new(samples_lat, samples_lng),
            bbox: None,
        }
    }

    pub fn bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// A uniform lattice over a bounding box.
#[derive(Debug, Clone, Copy)]
struct Lattice {
    bbox: BoundingBox,
    samples: SampleCounts,
    step_lat: f64,
    step_lng: f64,
}

impl Lattice {
    fn new(bbox: BoundingBox, samples: SampleCounts) -> Self {
        let samples = samples.clamped();
        Lattice {
            bbox,
            samples,
            step_lat: axis_step(bbox.min_lat, bbox.max_lat, samples.samples_lat),
            step_lng: axis_step(bbox.min_lng, bbox.max_lng, samples.samples_lng),
        }
    }

    fn lat_at(&self, i: usize) -> f64 {
        self.bbox.min_lat + self.step_lat * i as f64
    }

    fn lng_at(&self, j: usize) -> f64 {
        self.bbox.min_lng + self.step_lng * j as f64
    }

    /// The starting candidate before any node is scored.
    fn seed(&self) -> ExpectationResult {
        ExpectationResult {
            best_lat: self.bbox.min_lat,
            best_lng: self.bbox.min_lng,
            best_score: f64::NEG_INFINITY,
        }
    }

    /// Scans row `i` and returns its first maximum.
    fn best_in_row(&self, i: usize, points: &[Point], k: f64) -> ExpectationResult {
        let lat = self.lat_at(i);
        let mut best = ExpectationResult {
            best_lat: lat,
            best_lng: self.bbox.min_lng,
            best_score: f64::NEG_INFINITY,
        };
        for j in 0..self.samples.samples_lng {
            let lng = self.lng_at(j);
            let score = expected_score_at(lat, lng, points, k);
            if score > best.best_score {
                best = ExpectationResult {
                    best_lat: lat,
                    best_lng: lng,
                    best_score: score,
                };
            }
        }
        best
    }
}

/// Step between adjacent nodes; a single-node axis sits at `min`.
fn axis_step(min: f64, max: f64, samples: usize) -> f64 {
    if samples > 1 {
        (max - min) / (samples - 1) as f64
    } else {
        0.0
    }
}

/// Keeps `current` unless `candidate` is strictly better.
fn first_max(current: ExpectationResult, candidate: ExpectationResult) -> ExpectationResult {
    if candidate.best_score > current.best_score {
        candidate
    } else {
        current
    }
}

/// Approximates the location with the highest expected score.
///
/// Returns `None` when `points` is empty. Cost is
/// `O(samples_lat * samples_lng * points.len())`.
pub fn find_best_expectation_point(
    points: &[Point],
    k: f64,
    options: &SearchOptions,
) -> Option<ExpectationResult> {
    let lattice = lattice_for(points, options)?;

    let row_bests: Vec<ExpectationResult> = (0..lattice.samples.samples_lat)
        .into_par_iter()
        .map(|i| lattice.best_in_row(i, points, k))
        .collect();

    Some(row_bests.into_iter().fold(lattice.seed(), first_max))
}

/// Single-threaded row-major scan. Produces the same result as
/// `find_best_expectation_point`.
pub fn find_best_expectation_point_sequential(
    points: &[Point],
    k: f64,
    options: &SearchOptions,
) -> Option<ExpectationResult> {
    let lattice = lattice_for(points, options)?;
    let mut best = lattice.seed();

    for i in 0..lattice.samples.samples_lat {
        let lat = lattice.lat_at(i);
        for j in 0..lattice.samples.samples_lng {
            let lng = lattice.lng_at(j);
            let score = expected_score_at(lat, lng, points, k);
            if score > best.best_score {
                best = ExpectationResult {
                    best_lat: lat,
                    best_lng: lng,
                    best_score: score,
                };
            }
        }
    }

    Some(best)
}

fn lattice_for(points: &[Point], options: &SearchOptions) -> Option<Lattice> {
    if points.is_empty() {
        return None;
    }
    let bbox = match options.bbox {
        Some(b) => b,
        None => BoundingBox::enclosing(points)?,
    };
    Some(Lattice::new(bbox, options.samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::MAX_SCORE;

    #[test]
    fn empty_points_have_no_result() {
        assert!(find_best_expectation_point(&[], 0.01, &SearchOptions::default()).is_none());
        let opts = SearchOptions::default().bbox(BoundingBox::new(0.0, 1.0, 0.0, 1.0));
        assert!(find_best_expectation_point(&[], 0.01, &opts).is_none());
        assert!(find_best_expectation_point_sequential(&[], 0.01, &opts).is_none());
    }

    #[test]
    fn single_point_inside_box() {
        let points = vec![Point::new("solo", 35.0, 135.0)];
        let opts =
            SearchOptions::with_samples(5, 5).bbox(BoundingBox::new(34.0, 36.0, 134.0, 136.0));
        let result = find_best_expectation_point(&points, 0.01, &opts).unwrap();

        assert!((result.best_lat - 35.0).abs() < 0.05);
        assert!((result.best_lng - 135.0).abs() < 0.05);
        assert!(result.best_score > 4900.0);
    }

    #[test]
    fn single_point_with_default_box_is_exact() {
        let points = vec![Point::new("solo", -12.5, 48.25)];
        let opts = SearchOptions::default();
        let result = find_best_expectation_point(&points, 0.01, &opts).unwrap();
        assert_eq!(result.best_lat, -12.5);
        assert_eq!(result.best_lng, 48.25);
        assert_eq!(result.best_score, MAX_SCORE);
    }

    #[test]
    fn single_sample_per_axis_sits_at_box_minimum() {
        let points = vec![Point::new("a", 0.0, 0.0), Point::new("b", 10.0, 10.0)];
        let opts = SearchOptions::with_samples(0, 1);
        let result = find_best_expectation_point(&points, 0.01, &opts).unwrap();
        assert_eq!(result.best_lat, 0.0);
        assert_eq!(result.best_lng, 0.0);
    }

    #[test]
    fn lattice_covers_both_corners() {
        let lattice = Lattice::new(
            BoundingBox::new(-2.0, 2.0, 10.0, 20.0),
            SampleCounts::new(5, 3),
        );
        assert_eq!(lattice.lat_at(0), -2.0);
        assert_eq!(lattice.lat_at(4), 2.0);
        assert_eq!(lattice.lng_at(0), 10.0);
        assert_eq!(lattice.lng_at(2), 20.0);
    }

    #[test]
    fn ties_go_to_first_node_in_row_major_order() {
        // With K = 0 every node scores exactly MAX_SCORE.
        let points = vec![Point::new("a", 0.0, 0.0), Point::new("b", 5.0, 7.0)];
        let opts = SearchOptions::with_samples(4, 4);
        let result = find_best_expectation_point(&points, 0.0, &opts).unwrap();
        assert_eq!(result.best_lat, 0.0);
        assert_eq!(result.best_lng, 0.0);
        assert_eq!(result.best_score, MAX_SCORE);
    }

    #[test]
    fn symmetric_pair_tie_prefers_lower_latitude() {
        // Points mirrored across lat 0; nodes at lat -1 and +1 tie exactly.
        let points = vec![Point::new("n", 1.0, 0.0), Point::new("s", -1.0, 0.0)];
        let opts = SearchOptions::with_samples(2, 1);
        let result = find_best_expectation_point(&points, 0.01, &opts).unwrap();
        assert_eq!(result.best_lat, -1.0);
    }

    #[test]
    fn parallel_matches_sequential() {
        let points = vec![
            Point::new("a", 48.85, 2.35),
            Point::new("b", 52.52, 13.40),
            Point::new("c", 41.90, 12.50),
            Point::new("d", 40.42, -3.70),
        ];
        for k in [0.0, 0.0005, 0.01, 0.5] {
            let opts = SearchOptions::with_samples(17, 23);
            let par = find_best_expectation_point(&points, k, &opts);
            let seq = find_best_expectation_point_sequential(&points, k, &opts);
            assert_eq!(par, seq, "mismatch at k = {}", k);
        }
    }

    #[test]
    fn triangle_beats_centroid_and_vertex() {
        let points = vec![
            Point::new("a", 0.0, 0.0),
            Point::new("b", 0.0, 10.0),
            Point::new("c", 10.0, 0.0),
        ];
        let k = 0.0001;
        let opts = SearchOptions::with_samples(20, 20);
        let result = find_best_expectation_point(&points, k, &opts).unwrap();

        let at_vertex = expected_score_at(0.0, 0.0, &points, k);
        let at_centroid = expected_score_at(10.0 / 3.0, 10.0 / 3.0, &points, k);
        assert!(result.best_score >= at_centroid);
        assert!(result.best_score > at_vertex);
        assert!(result.best_lat > 0.0);
        assert!(result.best_lng > 0.0);
    }
}

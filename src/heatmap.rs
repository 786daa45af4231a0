//! Heatmap sampling over an explicit min/max/step grid.
//!
//! Coordinates are produced by repeatedly adding the step to the minimum,
//! and each axis runs while the coordinate is within `GRID_TOLERANCE` of the
//! maximum, so accumulated rounding does not drop the last row or column.

use rayon::prelude::*;

use crate::model::{GridError, GridSpec, HeatmapSample, Point};
use crate::scoring::expected_score_at;

/// Slack added to the upper bound of each axis.
pub const GRID_TOLERANCE: f64 = 1e-9;

/// Largest grid a single request may ask for (2048 x 2048 nodes).
pub const MAX_HEATMAP_NODES: usize = 2048 * 2048;

/// Upper estimate of the node count along one axis.
fn axis_node_count(min: f64, max: f64, step: f64) -> f64 {
    let span = max + GRID_TOLERANCE - min;
    if span < 0.0 {
        0.0
    } else {
        (span / step).floor() + 1.0
    }
}

/// Rejects grids too large to materialize, before allocating anything.
fn check_node_budget(grid: &GridSpec) -> Result<(), GridError> {
    let nodes = axis_node_count(grid.min_lat, grid.max_lat, grid.step_lat)
        * axis_node_count(grid.min_lng, grid.max_lng, grid.step_lng);
    if nodes > MAX_HEATMAP_NODES as f64 {
        return Err(GridError::TooManyNodes {
            nodes,
            limit: MAX_HEATMAP_NODES,
        });
    }
    Ok(())
}

/// Returns the axis coordinates `min, min + step, ...` up to `max`.
fn axis_values(
    axis: &'static str,
    min: f64,
    max: f64,
    step: f64,
) -> Result<Vec<f64>, GridError> {
    let mut values = Vec::new();
    let mut v = min;
    while v <= max + GRID_TOLERANCE {
        values.push(v);
        let next = v + step;
        if next <= v {
            return Err(GridError::StepBelowPrecision { axis, step, at: v });
        }
        v = next;
    }
    Ok(values)
}

/// Evaluates the expected score at every node of `grid`.
///
/// Samples are ordered latitude-major, longitude-minor. Fails without
/// scoring anything if a step is not strictly positive or too small to
/// advance the coordinate, if a bound is not finite, or if the grid has more
/// than `MAX_HEATMAP_NODES` nodes.
pub fn sample_heatmap(
    points: &[Point],
    k: f64,
    grid: &GridSpec,
) -> Result<Vec<HeatmapSample>, GridError> {
    grid.validate()?;
    check_node_budget(grid)?;

    let lats = axis_values("stepLat", grid.min_lat, grid.max_lat, grid.step_lat)?;
    let lngs = axis_values("stepLng", grid.min_lng, grid.max_lng, grid.step_lng)?;

    let rows: Vec<Vec<HeatmapSample>> = lats
        .par_iter()
        .map(|&lat| {
            lngs.iter()
                .map(|&lng| HeatmapSample {
                    lat,
                    lng,
                    value: expected_score_at(lat, lng, points, k),
                })
                .collect()
        })
        .collect();

    Ok(rows.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_grid() -> GridSpec {
        GridSpec {
            min_lat: -1.0,
            max_lat: 1.0,
            min_lng: -1.0,
            max_lng: 1.0,
            step_lat: 1.0,
            step_lng: 1.0,
        }
    }

    fn sample_points() -> Vec<Point> {
        vec![Point::new("p-0", 0.0, 0.0), Point::new("p-1", 0.0, 10.0)]
    }

    #[test]
    fn unit_grid_has_nine_nodes_with_exact_center() {
        let samples = sample_heatmap(&sample_points(), 0.01, &unit_grid()).unwrap();
        assert_eq!(samples.len(), 9);

        let center = samples
            .iter()
            .find(|s| s.lat == 0.0 && s.lng == 0.0)
            .expect("grid should contain (0, 0)");
        assert!(center.value > 0.0);
    }

    #[test]
    fn samples_are_lat_major() {
        let samples = sample_heatmap(&sample_points(), 0.01, &unit_grid()).unwrap();
        let coords: Vec<(f64, f64)> = samples.iter().map(|s| (s.lat, s.lng)).collect();
        assert_eq!(
            coords,
            vec![
                (-1.0, -1.0),
                (-1.0, 0.0),
                (-1.0, 1.0),
                (0.0, -1.0),
                (0.0, 0.0),
                (0.0, 1.0),
                (1.0, -1.0),
                (1.0, 0.0),
                (1.0, 1.0),
            ]
        );
    }

    #[test]
    fn tolerance_keeps_last_row() {
        // 0.1 accumulated ten times lands just short of 1.0.
        let grid = GridSpec {
            min_lat: 0.0,
            max_lat: 1.0,
            min_lng: 0.0,
            max_lng: 0.0,
            step_lat: 0.1,
            step_lng: 1.0,
        };
        let samples = sample_heatmap(&sample_points(), 0.01, &grid).unwrap();
        assert_eq!(samples.len(), 11);
        let last = samples.last().unwrap();
        assert!((last.lat - 1.0).abs() < 1e-9);
    }

    #[test]
    fn values_match_scoring_model() {
        let points = sample_points();
        let samples = sample_heatmap(&points, 0.01, &unit_grid()).unwrap();
        for s in &samples {
            assert_eq!(s.value, expected_score_at(s.lat, s.lng, &points, 0.01));
        }
    }

    #[test]
    fn empty_points_give_zero_values() {
        let samples = sample_heatmap(&[], 0.01, &unit_grid()).unwrap();
        assert_eq!(samples.len(), 9);
        assert!(samples.iter().all(|s| s.value == 0.0));
    }

    #[test]
    fn degenerate_grid_has_one_node() {
        let grid = GridSpec {
            min_lat: 3.0,
            max_lat: 3.0,
            min_lng: 4.0,
            max_lng: 4.0,
            step_lat: 0.5,
            step_lng: 0.5,
        };
        let samples = sample_heatmap(&sample_points(), 0.01, &grid).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!((samples[0].lat, samples[0].lng), (3.0, 4.0));
    }

    #[test]
    fn inverted_bounds_give_no_samples() {
        let mut grid = unit_grid();
        grid.min_lat = 2.0;
        let samples = sample_heatmap(&sample_points(), 0.01, &grid).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn rejects_non_positive_steps() {
        let mut grid = unit_grid();
        grid.step_lat = 0.0;
        assert!(matches!(
            sample_heatmap(&sample_points(), 0.01, &grid),
            Err(GridError::NonPositiveStep { axis: "stepLat", .. })
        ));

        let mut grid = unit_grid();
        grid.step_lng = -1.0;
        assert!(matches!(
            sample_heatmap(&sample_points(), 0.01, &grid),
            Err(GridError::NonPositiveStep { axis: "stepLng", .. })
        ));
    }

    #[test]
    fn rejects_step_lost_to_rounding() {
        // Below the f64 spacing at 1e6, but only ~100 nodes by count.
        let grid = GridSpec {
            min_lat: 1.0e6,
            max_lat: 1.0e6,
            min_lng: 0.0,
            max_lng: 0.0,
            step_lat: 1.0e-11,
            step_lng: 1.0,
        };
        assert!(matches!(
            sample_heatmap(&sample_points(), 0.01, &grid),
            Err(GridError::StepBelowPrecision { axis: "stepLat", .. })
        ));
    }

    #[test]
    fn rejects_oversized_grid_before_allocating() {
        let grid = GridSpec {
            min_lat: -90.0,
            max_lat: 90.0,
            min_lng: -180.0,
            max_lng: 180.0,
            step_lat: 1.0e-7,
            step_lng: 1.0,
        };
        match sample_heatmap(&sample_points(), 0.01, &grid) {
            Err(GridError::TooManyNodes { nodes, limit }) => {
                assert_eq!(limit, MAX_HEATMAP_NODES);
                assert!(nodes > 1.0e9);
            }
            other => panic!("expected TooManyNodes, got {:?}", other),
        }
    }

    #[test]
    fn grid_at_the_node_limit_is_accepted() {
        assert_eq!(axis_node_count(0.0, 2047.0, 1.0), 2048.0);
        assert_eq!(axis_node_count(0.0, 0.1, 0.1), 2.0);
        assert_eq!(axis_node_count(2.0, 1.0, 1.0), 0.0);

        let mut grid = GridSpec {
            min_lat: 0.0,
            max_lat: 2047.0,
            min_lng: 0.0,
            max_lng: 2047.0,
            step_lat: 1.0,
            step_lng: 1.0,
        };
        assert!(check_node_budget(&grid).is_ok());
        grid.max_lng = 2048.0;
        assert!(check_node_budget(&grid).is_err());
    }
}

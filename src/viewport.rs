//! Heatmap grid sizing for a map viewport.
//!
//! The grid gets denser as the map zooms in: 32 cells per axis at zoom 0,
//! doubling every three zoom levels, clamped to `[16, 256]`.

use crate::model::{BoundingBox, GridSpec};

const BASE_CELLS: f64 = 32.0;
const MIN_CELLS: f64 = 16.0;
const MAX_CELLS: f64 = 256.0;
const MAX_ZOOM: f64 = 12.0;
const MIN_SPAN_DEG: f64 = 0.0001;

/// Number of grid cells per axis at `zoom`.
pub fn cells_for_zoom(zoom: f64) -> usize {
    let scaled = (BASE_CELLS * 2f64.powf(zoom.min(MAX_ZOOM) / 3.0)).round();
    scaled.clamp(MIN_CELLS, MAX_CELLS) as usize
}

/// Derives a heatmap grid covering `bounds`. Both steps are always
/// strictly positive, even for a zero-span viewport.
pub fn grid_for_viewport(bounds: &BoundingBox, zoom: f64) -> GridSpec {
    let cells = cells_for_zoom(zoom);
    let lat_span = (bounds.max_lat - bounds.min_lat).max(MIN_SPAN_DEG);
    let lng_span = (bounds.max_lng - bounds.min_lng).max(MIN_SPAN_DEG);

    GridSpec {
        min_lat: bounds.min_lat,
        max_lat: bounds.max_lat,
        min_lng: bounds.min_lng,
        max_lng: bounds.max_lng,
        step_lat: lat_span / (cells - 1) as f64,
        step_lng: lng_span / (cells - 1) as f64,
    }
}

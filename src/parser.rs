//! Point-file parsing.
//!
//! Two JSON layouts are recognized:
//!
//! * a GeoGuessr map export: an object with a `customCoordinates` array of
//!   `{lat, lng, panoId?, countryCode?, stateCode?, ...}` entries, and
//! * a flat array of `{lat, lng}` objects.
//!
//! Entries without numeric `lat` and `lng` are skipped. Only a top-level
//! shape that matches neither layout, or text that is not JSON, is an error.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::model::{Coordinate, Point};

/// Errors that can occur when parsing a point file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("customCoordinates is required")]
    MissingCoordinates,

    #[error("unsupported JSON format")]
    UnsupportedFormat,
}

/// Which layout a point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointSource {
    GeoguessrJson,
    SimpleJson,
}

/// A parsed point together with the metadata carried alongside it.
/// Only `point` takes part in any computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointMeta {
    #[serde(flatten)]
    pub point: Point,
    pub source: PointSource,
    pub pano_id: Option<String>,
    pub country_code: Option<String>,
    pub state_code: Option<String>,
    /// The entry exactly as it appeared in the file.
    pub raw: Value,
}

impl PointMeta {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.point.lat, self.point.lng)
    }
}

/// Parses a GeoGuessr map export. Point ids are `gg-<map name>-<index>`.
pub fn parse_geoguessr_json(text: &str) -> Result<Vec<PointMeta>, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    geoguessr_points(&value)
}

/// Parses either supported layout. Flat-array point ids are
/// `simple-<index>`.
pub fn parse_points_from_json(text: &str) -> Result<Vec<PointMeta>, ParseError> {
    let value: Value = serde_json::from_str(text)?;

    if value
        .get("customCoordinates")
        .map_or(false, Value::is_array)
    {
        return geoguessr_points(&value);
    }

    match &value {
        Value::Array(entries) => Ok(collect_points(entries, PointSource::SimpleJson, |idx| {
            format!("simple-{}", idx)
        })),
        _ => Err(ParseError::UnsupportedFormat),
    }
}

/// Returns the coordinates of parsed points in wire form.
pub fn coordinates(points: &[PointMeta]) -> Vec<Coordinate> {
    points.iter().map(PointMeta::coordinate).collect()
}

fn geoguessr_points(value: &Value) -> Result<Vec<PointMeta>, ParseError> {
    let entries = value
        .get("customCoordinates")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingCoordinates)?;
    let map_name = value.get("name").and_then(Value::as_str).unwrap_or("map");

    Ok(collect_points(entries, PointSource::GeoguessrJson, |idx| {
        format!("gg-{}-{}", map_name, idx)
    }))
}

/// Converts entries into points. Ids use the entry's position in the file,
/// so skipped entries leave gaps.
fn collect_points<F>(entries: &[Value], source: PointSource, id_for: F) -> Vec<PointMeta>
where
    F: Fn(usize) -> String,
{
    let mut points = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let (lat, lng) = match (
            entry.get("lat").and_then(Value::as_f64),
            entry.get("lng").and_then(Value::as_f64),
        ) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                debug!(index = idx, "skipping entry without numeric lat/lng");
                continue;
            }
        };

        let text_field = |key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);
        let (pano_id, country_code, state_code) = match source {
            PointSource::GeoguessrJson => (
                text_field("panoId"),
                text_field("countryCode"),
                text_field("stateCode"),
            ),
            PointSource::SimpleJson => (None, None, None),
        };

        points.push(PointMeta {
            point: Point::new(id_for(idx), lat, lng),
            source,
            pano_id,
            country_code,
            state_code,
            raw: entry.clone(),
        });
    }
    points
}

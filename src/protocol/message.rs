//! Request and response messages.
//!
//! Both unions are tagged by a `type` field with a fixed payload per tag:
//!
//! ```text
//! {"type":"computeBest","points":[{"lat":0,"lng":0}],"K":0.01}
//! {"type":"computeHeatmap","points":[...],"K":0.01,"grid":{"minLat":-1,...,"stepLng":1}}
//! {"type":"bestResult","result":{"bestLat":0,"bestLng":0,"bestScore":5000}}
//! {"type":"heatmapResult","samples":[{"lat":0,"lng":0,"value":5000}]}
//! {"type":"error","message":"..."}
//! ```

use serde::{Deserialize, Serialize};

use crate::model::{Coordinate, ExpectationResult, GridSpec, HeatmapSample, Point};

/// Request tags understood by the dispatcher.
pub const REQUEST_TAGS: [&str; 2] = ["computeBest", "computeHeatmap"];

/// A caller-to-engine request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    /// Find the lattice node with the highest expected score.
    ComputeBest {
        points: Vec<Coordinate>,
        #[serde(rename = "K")]
        k: f64,
    },

    /// Sample the expected score over an explicit grid.
    ComputeHeatmap {
        points: Vec<Coordinate>,
        #[serde(rename = "K")]
        k: f64,
        grid: GridSpec,
    },
}

impl Request {
    /// Returns the wire tag of this request.
    pub fn tag(&self) -> &'static str {
        match self {
            Request::ComputeBest { .. } => "computeBest",
            Request::ComputeHeatmap { .. } => "computeHeatmap",
        }
    }

    pub fn points(&self) -> &[Coordinate] {
        match self {
            Request::ComputeBest { points, .. } | Request::ComputeHeatmap { points, .. } => points,
        }
    }
}

/// An engine-to-caller response. Every request produces exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    BestResult { result: Option<ExpectationResult> },
    HeatmapResult { samples: Vec<HeatmapSample> },
    Error { message: String },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    /// Returns the wire tag of this response.
    pub fn tag(&self) -> &'static str {
        match self {
            Response::BestResult { .. } => "bestResult",
            Response::HeatmapResult { .. } => "heatmapResult",
            Response::Error { .. } => "error",
        }
    }
}

/// Assigns the synthetic ids `p-0`, `p-1`, ... to wire coordinates.
pub fn to_points(coords: &[Coordinate]) -> Vec<Point> {
    coords
        .iter()
        .enumerate()
        .map(|(idx, c)| Point::new(format!("p-{}", idx), c.lat, c.lng))
        .collect()
}

//! Request dispatch.
//!
//! Routes each request to the optimizer or the heatmap sampler and turns
//! every failure into an `error` response. Nothing escapes: a panic inside
//! a computation is caught and reported like any other error.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::heatmap::sample_heatmap;
use crate::protocol::message::{to_points, Request, Response, REQUEST_TAGS};
use crate::search::{find_best_expectation_point, SearchOptions};

/// Stateless request handler. Holds only the search options applied to
/// `computeBest`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    search: SearchOptions,
}

impl Dispatcher {
    pub fn new(search: SearchOptions) -> Self {
        Dispatcher { search }
    }

    /// Handles a typed request. Always returns exactly one response.
    pub fn handle(&self, request: &Request) -> Response {
        let start = Instant::now();
        let tag = request.tag();
        let num_points = request.points().len();

        let response = guarded(tag, || self.route(request));

        match &response {
            Response::Error { message } => {
                warn!(request = tag, points = num_points, "{}", message);
            }
            other => {
                debug!(
                    request = tag,
                    response = other.tag(),
                    points = num_points,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "request handled"
                );
            }
        }
        response
    }

    /// Handles one JSON-encoded request.
    ///
    /// Invalid JSON, a missing or unknown `type` tag, and a malformed payload
    /// for a known tag all produce an `error` response.
    pub fn handle_json(&self, text: &str) -> Response {
        match decode_request(text) {
            Ok(request) => self.handle(&request),
            Err(message) => {
                warn!("rejected request: {}", message);
                Response::error(message)
            }
        }
    }

    fn route(&self, request: &Request) -> Response {
        match request {
            Request::ComputeBest { points, k } => {
                let points = to_points(points);
                let result = find_best_expectation_point(&points, *k, &self.search);
                if result.map_or(false, |r| !r.best_score.is_finite()) {
                    return overflowed(*k);
                }
                Response::BestResult { result }
            }
            Request::ComputeHeatmap { points, k, grid } => {
                let points = to_points(points);
                match sample_heatmap(&points, *k, grid) {
                    Ok(samples) if samples.iter().any(|s| !s.value.is_finite()) => {
                        overflowed(*k)
                    }
                    Ok(samples) => Response::HeatmapResult { samples },
                    Err(e) => Response::error(e.to_string()),
                }
            }
        }
    }
}

/// JSON has no encoding for infinite scores, which a negative K can produce.
fn overflowed(k: f64) -> Response {
    Response::error(format!("score overflowed for K={}", k))
}

/// Handles a request with default search options.
pub fn handle_request(request: &Request) -> Response {
    Dispatcher::default().handle(request)
}

/// Decodes a wire request, checking the tag before the payload so an
/// unknown kind is reported as such. The error is the message for an
/// `error` response.
pub fn decode_request(text: &str) -> Result<Request, String> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| format!("invalid request JSON: {}", e))?;

    let tag = match value.get("type") {
        Some(Value::String(tag)) => tag.clone(),
        Some(other) => return Err(format!("Unknown request type: {}", other)),
        None => return Err("Unknown request type: missing 'type' field".to_string()),
    };
    if !REQUEST_TAGS.contains(&tag.as_str()) {
        return Err(format!("Unknown request type: {}", tag));
    }

    serde_json::from_value(value).map_err(|e| format!("malformed {} request: {}", tag, e))
}

/// Runs `f`, converting a panic into an `error` response.
fn guarded<F>(tag: &str, f: F) -> Response
where
    F: FnOnce() -> Response,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(response) => response,
        Err(payload) => Response::error(format!(
            "{} failed: {}",
            tag,
            panic_message(payload.as_ref())
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

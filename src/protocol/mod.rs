//! Message protocol for the expectation engine.
//!
//! `message` defines the tagged request/response unions that cross the
//! execution boundary; `dispatch` routes requests to the optimizer and the
//! heatmap sampler and guarantees one response per request.

pub mod dispatch;
pub mod message;

pub use dispatch::{decode_request, handle_request, Dispatcher};
pub use message::{to_points, Request, Response, REQUEST_TAGS};

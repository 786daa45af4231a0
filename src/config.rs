//! Engine configuration.
//!
//! Options are set by name, the same way a protocol `setoption` would, so the
//! binary's argument parser and any embedding caller share one code path.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::SampleCounts;
use crate::search::SearchOptions;

/// Default decay rate, per kilometer.
pub const DEFAULT_DECAY: f64 = 0.01;

/// Default thread name for the worker executor.
pub const DEFAULT_WORKER_NAME: &str = "expectation-worker";

/// Errors raised while applying configuration options.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for option '{name}'")]
    InvalidValue { name: String, value: String },
}

/// Where requests are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// On a dedicated worker thread, falling back to `Local` if the thread
    /// cannot be spawned.
    #[default]
    Worker,
    /// Synchronously on the caller's thread.
    Local,
}

impl FromStr for ExecutionMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "worker" => Ok(ExecutionMode::Worker),
            "local" | "sync" => Ok(ExecutionMode::Local),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Worker => write!(f, "worker"),
            ExecutionMode::Local => write!(f, "local"),
        }
    }
}

/// Configuration for the expectation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Lattice resolution for `computeBest`.
    pub samples: SampleCounts,
    /// Decay rate used when the caller does not supply one (point-file mode).
    pub k: f64,
    /// Requested execution mode.
    pub mode: ExecutionMode,
    /// Name given to the worker thread.
    pub worker_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            samples: SampleCounts::default(),
            k: DEFAULT_DECAY,
            mode: ExecutionMode::default(),
            worker_name: DEFAULT_WORKER_NAME.to_string(),
        }
    }
}

impl EngineConfig {
    /// Sets an option by name. Recognized names are `SamplesLat`,
    /// `SamplesLng`, `K`, `Mode`, and `WorkerName` (case-insensitive).
    ///
    /// `K` only has to parse as a finite number; negative values are kept.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };

        match name.to_ascii_lowercase().as_str() {
            "sampleslat" => {
                let n = value.parse::<usize>().map_err(|_| invalid())?;
                self.samples = SampleCounts::new(n, self.samples.samples_lng);
            }
            "sampleslng" => {
                let n = value.parse::<usize>().map_err(|_| invalid())?;
                self.samples = SampleCounts::new(self.samples.samples_lat, n);
            }
            "k" => {
                let k = value.parse::<f64>().map_err(|_| invalid())?;
                if !k.is_finite() {
                    return Err(invalid());
                }
                self.k = k;
            }
            "mode" => {
                self.mode = value.parse().map_err(|_| invalid())?;
            }
            "workername" => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                self.worker_name = value.to_string();
            }
            _ => return Err(ConfigError::UnknownOption(name.to_string())),
        }
        Ok(())
    }

    /// Search options derived from this configuration.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            samples: self.samples,
            bbox: None,
        }
    }
}

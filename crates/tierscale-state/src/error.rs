//! Error types for operations on the simulation state.

use std::fmt;

use thiserror::Error;

/// Result type alias for state operations.
pub type SimResult<T> = Result<T, SimError>;

/// A scalable resource tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    AppServer,
    Database,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::AppServer => write!(f, "app server"),
            Resource::Database => write!(f, "database"),
        }
    }
}

/// Errors surfaced by bounds-checked operator commands.
///
/// The tick step itself never fails; these only come from manual
/// overrides and input validation at the API boundary.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("{resource} count {requested} outside [{min}, {max}]")]
    Bounds {
        resource: Resource,
        requested: u32,
        min: u32,
        max: u32,
    },

    #[error("manual topology changes are disabled while auto-scaling is active")]
    AutoScalingActive,

    #[error("invalid traffic level: {0}")]
    InvalidTraffic(f64),
}

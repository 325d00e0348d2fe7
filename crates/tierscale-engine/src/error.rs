//! Engine error types.

use thiserror::Error;

use tierscale_state::SimError;

/// Errors returned through a [`DriverHandle`](crate::DriverHandle).
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("tick driver is not running")]
    Closed,

    #[error(transparent)]
    Sim(#[from] SimError),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

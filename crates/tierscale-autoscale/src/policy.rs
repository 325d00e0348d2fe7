//! Autoscaling thresholds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid threshold combinations.
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("{dimension}: scale-down threshold {down} must be below scale-up threshold {up}")]
    Inverted {
        dimension: &'static str,
        down: f64,
        up: f64,
    },

    #[error("{name} must be a finite non-negative number, got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("{name} is a utilization fraction and must lie in [0, 1], got {value}")]
    NotAFraction { name: &'static str, value: f64 },
}

/// Thresholds the controller compares tick loads against.
///
/// Utilization thresholds are fractions of capacity. Loaded from the
/// `[autoscale]` table of the config file; missing keys keep defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoscalePolicy {
    /// Add a server above this fraction of server capacity.
    pub server_scale_up: f64,
    /// Remove a server below this fraction of server capacity.
    pub server_scale_down: f64,
    /// Add the queue tier above this db utilization.
    pub queue_add_db_utilization: f64,
    /// Remove the queue tier below this db utilization (empty backlog only).
    pub queue_remove_db_utilization: f64,
    /// Add a db replica while the queue backlog exceeds this many items.
    pub db_scale_up_backlog: f64,
    /// Remove a db replica below this db utilization.
    pub db_scale_down_utilization: f64,
}

impl Default for AutoscalePolicy {
    fn default() -> Self {
        Self {
            server_scale_up: 0.8,
            server_scale_down: 0.3,
            queue_add_db_utilization: 0.8,
            queue_remove_db_utilization: 0.2,
            db_scale_up_backlog: 200.0,
            db_scale_down_utilization: 0.3,
        }
    }
}

impl AutoscalePolicy {
    /// Check that every threshold is usable and each down/up pair leaves a gap.
    ///
    /// The db dimension has no pair: it scales up on backlog items and down
    /// on utilization.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (name, value) in [
            ("server_scale_up", self.server_scale_up),
            ("server_scale_down", self.server_scale_down),
            ("queue_add_db_utilization", self.queue_add_db_utilization),
            ("queue_remove_db_utilization", self.queue_remove_db_utilization),
            ("db_scale_up_backlog", self.db_scale_up_backlog),
            ("db_scale_down_utilization", self.db_scale_down_utilization),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PolicyError::OutOfRange { name, value });
            }
        }
        for (name, value) in [
            ("server_scale_up", self.server_scale_up),
            ("server_scale_down", self.server_scale_down),
            ("queue_add_db_utilization", self.queue_add_db_utilization),
            ("queue_remove_db_utilization", self.queue_remove_db_utilization),
            ("db_scale_down_utilization", self.db_scale_down_utilization),
        ] {
            if value > 1.0 {
                return Err(PolicyError::NotAFraction { name, value });
            }
        }

        if self.server_scale_down >= self.server_scale_up {
            return Err(PolicyError::Inverted {
                dimension: "servers",
                down: self.server_scale_down,
                up: self.server_scale_up,
            });
        }
        if self.queue_remove_db_utilization >= self.queue_add_db_utilization {
            return Err(PolicyError::Inverted {
                dimension: "queue",
                down: self.queue_remove_db_utilization,
                up: self.queue_add_db_utilization,
            });
        }
        Ok(())
    }
}

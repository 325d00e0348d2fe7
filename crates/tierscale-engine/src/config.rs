//! `[simulation]` configuration table.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use tierscale_state::{DEFAULT_TRAFFIC_LEVEL, MAX_TRAFFIC_LEVEL};

use crate::error::ConfigError;

/// How the simulation starts and how fast it ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Wall-clock milliseconds between ticks.
    pub tick_interval_ms: u64,
    /// RNG seed for the traffic noise. Unseeded runs draw from OS entropy.
    pub seed: Option<u64>,
    /// Operator traffic target at start-up (req/s).
    pub initial_traffic: f64,
    /// Whether the controller starts enabled.
    pub auto_scaling: bool,
    /// Whether the driver starts ticking immediately.
    pub start_playing: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            seed: None,
            initial_traffic: DEFAULT_TRAFFIC_LEVEL,
            auto_scaling: true,
            start_playing: true,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "simulation.tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        if !self.initial_traffic.is_finite()
            || self.initial_traffic < 0.0
            || self.initial_traffic > MAX_TRAFFIC_LEVEL
        {
            return Err(ConfigError::Invalid(format!(
                "simulation.initial_traffic must be within [0, {MAX_TRAFFIC_LEVEL}], got {}",
                self.initial_traffic
            )));
        }
        Ok(())
    }
}

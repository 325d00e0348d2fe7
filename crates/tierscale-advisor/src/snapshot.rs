//! The read-only view of the simulation handed to an advisor.

use serde::{Deserialize, Serialize};

use tierscale_state::SimulationState;

/// Numeric fields of a [`SimulationState`] an advisor may see.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisorySnapshot {
    /// Traffic that reached the load balancer on the last tick (req/s).
    pub traffic: f64,
    pub server_count: u32,
    pub db_count: u32,
    pub has_queue: bool,
    pub queue_size: f64,
    pub is_auto_scaling: bool,
}

impl From<&SimulationState> for AdvisorySnapshot {
    fn from(state: &SimulationState) -> Self {
        Self {
            traffic: state.actual_traffic,
            server_count: state.server_count,
            db_count: state.db_count,
            has_queue: state.has_queue,
            queue_size: state.queue_size,
            is_auto_scaling: state.is_auto_scaling,
        }
    }
}

impl AdvisorySnapshot {
    /// Render the prompt sent to a text-generation endpoint.
    pub fn prompt(&self) -> String {
        let mode = if self.is_auto_scaling {
            "automatic"
        } else {
            "manual"
        };
        let queue = if self.has_queue {
            format!("enabled, {:.0} items pending", self.queue_size)
        } else {
            "disabled".to_string()
        };
        format!(
            "Analyze the current state of a three-tier web architecture and write a short \
             status report with one concrete recommendation.\n\
             Incoming traffic: {:.0} req/s\n\
             Application servers: {}\n\
             Database nodes: {}\n\
             Message queue: {queue}\n\
             Scaling mode: {mode}",
            self.traffic, self.server_count, self.db_count,
        )
    }
}

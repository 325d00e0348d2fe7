//! Load propagation through the server, queue and database tiers.

use tracing::trace;

use tierscale_state::{
    DB_CAPACITY, QUEUE_PROCESS_RATE, SERVER_CAPACITY, SimulationState, non_negative,
};

use crate::latency::estimate_latency;

/// Everything the model computed for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickLoad {
    /// Traffic that reached the load balancer (req/s).
    pub actual_traffic: f64,
    /// Total server capacity (req/s).
    pub max_server_capacity: f64,
    /// Traffic absorbed by the servers.
    pub server_load: f64,
    /// Traffic beyond server capacity; dropped downstream.
    pub overloaded_traffic: f64,
    /// Processed rate reaching the databases.
    pub throughput_to_db: f64,
    /// Queue backlog at the start of the tick.
    pub queue_before: f64,
    /// Queue backlog carried into the next tick.
    pub next_queue_size: f64,
    /// Total database capacity (req/s).
    pub max_db_capacity: f64,
    /// `throughput_to_db / max_db_capacity`; may exceed 1.
    pub db_utilization: f64,
    /// Modeled latency in milliseconds.
    pub latency_ms: f64,
}

impl TickLoad {
    /// Fraction of server capacity in use, in `[0, 1]`.
    pub fn server_utilization(&self) -> f64 {
        self.server_load / self.max_server_capacity
    }

    /// Whether any traffic overflowed the server tier.
    pub fn is_overloaded(&self) -> bool {
        self.overloaded_traffic > 0.0
    }
}

/// Propagate `actual_traffic` through the topology described by `state`.
///
/// Without a queue the backlog is dropped unconditionally. Counts are read
/// clamped to at least one, so the utilization divisions are always defined.
pub fn propagate(state: &SimulationState, actual_traffic: f64) -> TickLoad {
    let traffic = non_negative(actual_traffic);
    let servers = state.server_count.max(1);
    let dbs = state.db_count.max(1);

    let max_server_capacity = f64::from(servers) * SERVER_CAPACITY;
    let server_load = traffic.min(max_server_capacity);
    let overloaded_traffic = (traffic - max_server_capacity).max(0.0);

    let queue_before = if state.has_queue {
        non_negative(state.queue_size)
    } else {
        0.0
    };

    let (throughput_to_db, next_queue_size) = if state.has_queue {
        let queued = queue_before + server_load;
        let processed = queued.min(QUEUE_PROCESS_RATE);
        (processed, queued - processed)
    } else {
        (server_load, 0.0)
    };

    let max_db_capacity = f64::from(dbs) * DB_CAPACITY;
    let db_utilization = throughput_to_db / max_db_capacity;

    let latency_ms = estimate_latency(
        server_load / max_server_capacity,
        db_utilization,
        state.has_queue,
        queue_before,
        overloaded_traffic > 0.0,
    );

    trace!(
        traffic,
        server_load,
        overloaded_traffic,
        throughput_to_db,
        next_queue_size,
        db_utilization,
        latency_ms,
        "load propagated"
    );

    TickLoad {
        actual_traffic: traffic,
        max_server_capacity,
        server_load,
        overloaded_traffic,
        throughput_to_db,
        queue_before,
        next_queue_size,
        max_db_capacity,
        db_utilization,
        latency_ms,
    }
}

//! Additive latency model.

/// Floor latency of a request through an idle system.
pub const BASE_LATENCY_MS: f64 = 20.0;

/// Latency added at full server utilization.
pub const SERVER_LATENCY_MS: f64 = 100.0;

/// Latency added per unit of database utilization.
///
/// 200 ms at 100% utilization, scaled linearly and not clamped: utilization
/// above 1.0 adds more. Latency is unbounded above, and an overloaded db
/// tier has to show up in it.
pub const DB_LATENCY_MS: f64 = 200.0;

/// Latency added per item waiting in the queue at the start of the tick.
pub const QUEUE_LATENCY_PER_ITEM_MS: f64 = 0.5;

/// Flat penalty when requests overflow server capacity and time out.
pub const TIMEOUT_PENALTY_MS: f64 = 5000.0;

/// Estimate end-to-end latency in milliseconds.
///
/// `queue_backlog` is the queue depth before this tick's arrivals and is
/// ignored when `has_queue` is false. The db term is not capped, so a
/// saturated database keeps adding latency past 100% utilization.
pub fn estimate_latency(
    server_utilization: f64,
    db_utilization: f64,
    has_queue: bool,
    queue_backlog: f64,
    overloaded: bool,
) -> f64 {
    let mut latency = BASE_LATENCY_MS
        + server_utilization * SERVER_LATENCY_MS
        + db_utilization * DB_LATENCY_MS;
    if has_queue {
        latency += queue_backlog * QUEUE_LATENCY_PER_ITEM_MS;
    }
    if overloaded {
        latency += TIMEOUT_PENALTY_MS;
    }
    latency
}

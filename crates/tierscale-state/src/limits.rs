//! Capacity constants of the simulated architecture.

/// Maximum number of application servers.
pub const MAX_SERVERS: u32 = 8;

/// Maximum number of databases (primary + read replicas).
pub const MAX_DBS: u32 = 4;

/// Requests per second a single application server can absorb.
pub const SERVER_CAPACITY: f64 = 150.0;

/// Requests per second a single database can absorb.
pub const DB_CAPACITY: f64 = 400.0;

/// Items drained from the queue tier per tick.
pub const QUEUE_PROCESS_RATE: f64 = 300.0;

/// Retained entries in both the metrics history and the event log.
pub const HISTORY_LIMIT: usize = 50;

/// Operator traffic target at start-up and after a reset.
pub const DEFAULT_TRAFFIC_LEVEL: f64 = 100.0;

/// Upper bound accepted for the operator traffic target.
pub const MAX_TRAFFIC_LEVEL: f64 = 100_000.0;

//! tierscale-metrics: observability over simulation snapshots.
//!
//! Summarizes the bounded metrics history and renders the latest snapshot
//! in the Prometheus text exposition format.
//!
//! # Architecture
//!
//! ```text
//! SimulationState snapshot
//!   ├── WindowSummary::from_history() → aggregates over metrics_history
//!   └── render_prometheus()           → text/plain for /metrics
//! ```

pub mod prometheus;
pub mod summary;

pub use prometheus::render_prometheus;
pub use summary::WindowSummary;

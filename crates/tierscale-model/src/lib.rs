//! tierscale-model: physical load propagation for one tick.
//!
//! Given the current topology and a traffic sample, computes how much load
//! each tier absorbs, how the queue tier buffers writes, and the resulting
//! end-to-end latency. Everything here is a total numeric function.
//!
//! # Pipeline
//!
//! ```text
//! traffic_level ──sample()──▶ actual_traffic
//!                                  │
//!                                  ▼
//!   servers: min(traffic, n * 150)  ── overflow dropped (+5000ms timeout)
//!                                  │
//!   queue (optional): backlog += load, drain ≤ 300/tick
//!                                  │
//!                                  ▼
//!   databases: utilization = throughput / (m * 400)
//! ```

pub mod latency;
pub mod load;
pub mod traffic;

pub use latency::estimate_latency;
pub use load::{TickLoad, propagate};
pub use traffic::sample;

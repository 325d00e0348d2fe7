//! tierscale-state: domain types for the tier simulation.
//!
//! Holds the single owned [`SimulationState`] that the tick driver threads
//! from one tick to the next, the immutable records produced each tick
//! ([`MetricSample`], [`ScalingEvent`]), and the capacity constants shared by
//! the architecture model and the autoscaling controller.
//!
//! # Architecture
//!
//! ```text
//! SimulationState
//!   ├── traffic / topology fields (server_count, db_count, has_queue, queue_size)
//!   ├── metrics_history: BoundedDeque<MetricSample>   (chronological, cap 50)
//!   └── logs:            BoundedDeque<ScalingEvent>   (newest first, cap 50)
//! ```
//!
//! Nothing here performs I/O. State is cloned or moved, never shared mutably.

pub mod error;
pub mod history;
pub mod limits;
pub mod types;

pub use error::{Resource, SimError, SimResult};
pub use history::BoundedDeque;
pub use limits::*;
pub use types::*;

//! tierscale-engine: advancing the simulation one tick at a time.
//!
//! Combines the architecture model and the autoscaler into a single step
//! function, exposes the operator commands that rewrite the state between
//! ticks, and provides the [`TickDriver`] that fires the step on a fixed
//! interval and publishes each new state as an immutable snapshot.
//!
//! # Architecture
//!
//! ```text
//! TickDriver (tokio task, sole owner)
//!   ├── Simulation
//!   │   ├── SimulationState        replaced wholesale every tick
//!   │   ├── TickEngine             propagate() → Autoscaler::evaluate()
//!   │   ├── StdRng                 seeded traffic noise
//!   │   └── Clock                  event / sample timestamps
//!   ├── mpsc<DriverMessage>        operator commands, play / pause / step
//!   └── watch<Arc<SimulationState>> snapshots for readers
//! ```

pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod ops;
pub mod simulation;

pub use clock::{Clock, SystemClock, VirtualClock};
pub use config::SimulationConfig;
pub use driver::{DriverHandle, TickDriver};
pub use error::{ConfigError, DriverError, DriverResult};
pub use ops::*;
pub use simulation::{Command, Simulation};

//! tierscale-advisor: the advisory capability.
//!
//! An [`Advisor`] turns a read-only [`AdvisorySnapshot`] of the simulation
//! into a short free-text status report. It fails open: configuration gaps
//! and transport errors come back as fixed fallback strings, never as errors.
//!
//! # Architecture
//!
//! ```text
//! AdvisoryGate (at most one request in flight)
//!   └── Arc<dyn Advisor>
//!         ├── DisabledAdvisor   no endpoint configured
//!         └── HttpAdvisor       POST {"prompt"} → {"text"} over hyper http1
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub mod client;
pub mod error;
pub mod gate;
pub mod snapshot;

pub use client::{AdvisorConfig, HttpAdvisor};
pub use error::{AdvisorError, AdvisorResult};
pub use gate::{AdvisoryGate, AdvisoryOutcome};
pub use snapshot::AdvisorySnapshot;

/// Returned when no advisor endpoint is configured.
pub const NOT_CONFIGURED_MESSAGE: &str =
    "Advisory service is not configured. Set an advisor endpoint to enable status reports.";

/// Returned when the advisory request fails for any reason.
pub const FAILURE_MESSAGE: &str = "Unable to generate an advisory report. Please try again later.";

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Produces a human-readable assessment of a state snapshot.
///
/// Implementations never fail past this boundary.
pub trait Advisor: Send + Sync {
    fn summarize<'a>(&'a self, snapshot: &'a AdvisorySnapshot) -> BoxFuture<'a, String>;
}

/// Advisor used when nothing is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAdvisor;

impl Advisor for DisabledAdvisor {
    fn summarize<'a>(&'a self, _snapshot: &'a AdvisorySnapshot) -> BoxFuture<'a, String> {
        Box::pin(async { NOT_CONFIGURED_MESSAGE.to_string() })
    }
}

/// Build the advisor described by `config`.
pub fn from_config(config: &AdvisorConfig) -> Arc<dyn Advisor> {
    match HttpAdvisor::from_config(config) {
        Some(advisor) => Arc::new(advisor),
        None => {
            tracing::info!("advisor endpoint not configured, advisory reports disabled");
            Arc::new(DisabledAdvisor)
        }
    }
}

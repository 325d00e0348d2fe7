//! Single-flight access to an [`Advisor`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, warn};

use crate::snapshot::AdvisorySnapshot;
use crate::{Advisor, FAILURE_MESSAGE};

/// Result of asking the gate for a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "report", rename_all = "snake_case")]
pub enum AdvisoryOutcome {
    Report(String),
    /// Another request is still running.
    Busy,
}

/// Clears the in-flight flag when the request task ends, however it ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Wraps an advisor so at most one request runs at a time.
///
/// The request runs in its own task on an owned snapshot, so neither the
/// caller nor the tick loop is ever blocked by it. If the caller goes away
/// the request still runs to completion and the gate stays busy until then.
#[derive(Clone)]
pub struct AdvisoryGate {
    advisor: Arc<dyn Advisor>,
    in_flight: Arc<AtomicBool>,
}

impl AdvisoryGate {
    pub fn new(advisor: Arc<dyn Advisor>) -> Self {
        Self {
            advisor,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Request a report, or [`AdvisoryOutcome::Busy`] if one is running.
    pub async fn request(&self, snapshot: AdvisorySnapshot) -> AdvisoryOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("advisory request already in flight");
            return AdvisoryOutcome::Busy;
        }

        let guard = InFlight(self.in_flight.clone());
        let advisor = self.advisor.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            advisor.summarize(&snapshot).await
        });

        match task.await {
            Ok(report) => AdvisoryOutcome::Report(report),
            Err(e) => {
                warn!(error = %e, "advisory task failed");
                AdvisoryOutcome::Report(FAILURE_MESSAGE.to_string())
            }
        }
    }
}

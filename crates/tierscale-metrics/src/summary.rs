//! Aggregates over the trailing metrics window.

use serde::Serialize;

use tierscale_state::{MetricSample, SERVER_CAPACITY};

/// Summary statistics over the samples currently retained in history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowSummary {
    pub samples: usize,
    pub first_tick: u64,
    pub last_tick: u64,
    pub mean_traffic: f64,
    pub mean_latency_ms: f64,
    pub max_latency_ms: f64,
    pub mean_server_load: f64,
    pub mean_db_load: f64,
    pub peak_queue_size: f64,
    /// Ticks whose traffic exceeded the serving server capacity.
    pub overloaded_ticks: usize,
}

impl WindowSummary {
    /// Aggregate `history`, oldest first. An empty history yields all zeros.
    pub fn from_history<'a, I>(history: I) -> Self
    where
        I: IntoIterator<Item = &'a MetricSample>,
    {
        let mut summary = Self::default();
        let mut traffic = 0.0;
        let mut latency = 0.0;
        let mut server_load = 0.0;
        let mut db_load = 0.0;

        for sample in history {
            if summary.samples == 0 {
                summary.first_tick = sample.tick;
            }
            summary.samples += 1;
            summary.last_tick = sample.tick;

            traffic += sample.traffic;
            latency += sample.latency_ms;
            server_load += sample.server_load;
            db_load += sample.db_load;
            summary.max_latency_ms = summary.max_latency_ms.max(sample.latency_ms);
            summary.peak_queue_size = summary.peak_queue_size.max(sample.queue_size);

            if sample.traffic > f64::from(sample.server_count.max(1)) * SERVER_CAPACITY {
                summary.overloaded_ticks += 1;
            }
        }

        if summary.samples > 0 {
            let n = summary.samples as f64;
            summary.mean_traffic = traffic / n;
            summary.mean_latency_ms = latency / n;
            summary.mean_server_load = server_load / n;
            summary.mean_db_load = db_load / n;
        }
        summary
    }
}

//! Domain types for the tier simulation.
//!
//! `SimulationState` is the whole world of one simulation: the operator's
//! traffic target, the current topology, and the bounded trailing history
//! of samples and events. It is replaced wholesale every tick.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::history::BoundedDeque;
use crate::limits::*;

// ── Events ────────────────────────────────────────────────────────

/// Opaque, unique identifier of a scaling event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(u64);

impl EventId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt-{:06}", self.0)
    }
}

/// Severity of an event in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Info,
    Warning,
    Error,
    Success,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Info => write!(f, "INFO"),
            EventKind::Warning => write!(f, "WARNING"),
            EventKind::Error => write!(f, "ERROR"),
            EventKind::Success => write!(f, "SUCCESS"),
        }
    }
}

/// A human-readable record of a scaling decision or operator action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalingEvent {
    pub id: EventId,
    /// Unix timestamp (milliseconds).
    pub timestamp_ms: u64,
    pub message: String,
    pub kind: EventKind,
}

// ── Metrics ───────────────────────────────────────────────────────

/// Outcome of a single tick, appended to the metrics history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricSample {
    /// Unix timestamp (milliseconds).
    pub timestamp_ms: u64,
    /// Tick number this sample was produced by (1-based).
    pub tick: u64,
    /// Noisy traffic that hit the load balancer (req/s).
    pub traffic: f64,
    /// Modeled end-to-end latency in milliseconds.
    pub latency_ms: f64,
    /// Server tier utilization, percent of total server capacity.
    pub server_load: f64,
    /// Database tier utilization, percent of total db capacity. May exceed 100.
    pub db_load: f64,
    pub server_count: u32,
    pub db_count: u32,
    /// Queue backlog left after this tick.
    pub queue_size: f64,
}

// ── Topology ──────────────────────────────────────────────────────

/// The active tiers and resource counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub server_count: u32,
    pub db_count: u32,
    pub has_queue: bool,
}

impl Topology {
    /// Clamp both counts into their valid ranges.
    pub fn clamped(self) -> Self {
        Self {
            server_count: self.server_count.clamp(1, MAX_SERVERS),
            db_count: self.db_count.clamp(1, MAX_DBS),
            has_queue: self.has_queue,
        }
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            server_count: 1,
            db_count: 1,
            has_queue: false,
        }
    }
}

// ── Simulation state ──────────────────────────────────────────────

/// Complete state of one simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationState {
    /// Operator-set target load (req/s).
    pub traffic_level: f64,
    /// Most recent noisy traffic sample (req/s).
    pub actual_traffic: f64,
    pub server_count: u32,
    pub db_count: u32,
    pub has_queue: bool,
    /// Outstanding items in the queue tier. Always 0 without a queue.
    pub queue_size: f64,
    /// Whether the controller may change counts and topology.
    pub is_auto_scaling: bool,
    /// Chronological, oldest first.
    pub metrics_history: BoundedDeque<MetricSample>,
    /// Newest first.
    pub logs: BoundedDeque<ScalingEvent>,
    /// Completed ticks since initialization.
    pub tick: u64,
    /// Next raw event id. Never rewinds, so ids stay unique across resets.
    pub next_event_id: u64,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            traffic_level: DEFAULT_TRAFFIC_LEVEL,
            actual_traffic: 0.0,
            server_count: 1,
            db_count: 1,
            has_queue: false,
            queue_size: 0.0,
            is_auto_scaling: true,
            metrics_history: BoundedDeque::new(HISTORY_LIMIT),
            logs: BoundedDeque::new(HISTORY_LIMIT),
            tick: 0,
            next_event_id: 1,
        }
    }
}

impl SimulationState {
    /// The current topology.
    pub fn topology(&self) -> Topology {
        Topology {
            server_count: self.server_count,
            db_count: self.db_count,
            has_queue: self.has_queue,
        }
    }

    /// Replace the topology, clamping counts and dropping the backlog if
    /// the queue tier goes away.
    pub fn apply_topology(&mut self, topology: Topology) {
        let topology = topology.clamped();
        self.server_count = topology.server_count;
        self.db_count = topology.db_count;
        self.has_queue = topology.has_queue;
        if !self.has_queue {
            self.queue_size = 0.0;
        }
    }

    /// Prepend a new event to the log and return its id.
    pub fn push_event(
        &mut self,
        kind: EventKind,
        message: impl Into<String>,
        timestamp_ms: u64,
    ) -> EventId {
        let id = EventId::new(self.next_event_id);
        self.next_event_id += 1;
        self.logs.push_front(ScalingEvent {
            id,
            timestamp_ms,
            message: message.into(),
            kind,
        });
        id
    }

    /// Append a sample to the metrics history.
    pub fn record_sample(&mut self, sample: MetricSample) {
        self.metrics_history.push_back(sample);
    }

    /// The most recent metric sample, if any tick has run.
    pub fn latest_sample(&self) -> Option<&MetricSample> {
        self.metrics_history.back()
    }

    /// Force every invariant to hold: counts in range, non-negative finite
    /// traffic and backlog, no backlog without a queue.
    pub fn enforce_invariants(&mut self) {
        self.apply_topology(self.topology());
        self.traffic_level = non_negative(self.traffic_level).min(MAX_TRAFFIC_LEVEL);
        self.actual_traffic = non_negative(self.actual_traffic);
        self.queue_size = non_negative(self.queue_size);
        if !self.has_queue {
            self.queue_size = 0.0;
        }
    }
}

/// Map negative and non-finite values to zero.
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_initial_contract() {
        let s = SimulationState::default();
        assert_eq!(s.traffic_level, 100.0);
        assert_eq!(s.server_count, 1);
        assert_eq!(s.db_count, 1);
        assert!(!s.has_queue);
        assert_eq!(s.queue_size, 0.0);
        assert!(s.is_auto_scaling);
        assert!(s.metrics_history.is_empty());
        assert!(s.logs.is_empty());
        assert_eq!(s.logs.capacity(), HISTORY_LIMIT);
    }

    #[test]
    fn push_event_is_newest_first_with_unique_ids() {
        let mut s = SimulationState::default();
        let a = s.push_event(EventKind::Info, "first", 1);
        let b = s.push_event(EventKind::Success, "second", 2);
        assert_ne!(a, b);
        assert_eq!(s.logs.front().unwrap().message, "second");
        assert_eq!(s.logs.back().unwrap().message, "first");
    }

    #[test]
    fn log_stays_bounded() {
        let mut s = SimulationState::default();
        for i in 0..120 {
            s.push_event(EventKind::Info, format!("event {i}"), i);
        }
        assert_eq!(s.logs.len(), HISTORY_LIMIT);
        assert_eq!(s.logs.front().unwrap().message, "event 119");
        assert_eq!(s.logs.back().unwrap().message, "event 70");
    }

    #[test]
    fn apply_topology_clamps_and_drops_backlog() {
        let mut s = SimulationState {
            has_queue: true,
            queue_size: 120.0,
            ..Default::default()
        };
        s.apply_topology(Topology {
            server_count: 99,
            db_count: 0,
            has_queue: false,
        });
        assert_eq!(s.server_count, MAX_SERVERS);
        assert_eq!(s.db_count, 1);
        assert_eq!(s.queue_size, 0.0);
    }

    #[test]
    fn enforce_invariants_repairs_bad_values() {
        let mut s = SimulationState {
            traffic_level: f64::NAN,
            actual_traffic: -3.0,
            server_count: 0,
            db_count: 12,
            queue_size: 40.0,
            ..Default::default()
        };
        s.enforce_invariants();
        assert_eq!(s.traffic_level, 0.0);
        assert_eq!(s.actual_traffic, 0.0);
        assert_eq!(s.server_count, 1);
        assert_eq!(s.db_count, MAX_DBS);
        assert_eq!(s.queue_size, 0.0);
    }

    #[test]
    fn event_id_display_is_opaque_token() {
        assert_eq!(EventId::new(42).to_string(), "evt-000042");
    }

    #[test]
    fn event_kind_serializes_uppercase() {
        let json = serde_json::to_string(&EventKind::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");
    }
}

//! State transitions: the tick step and the operator commands.
//!
//! Every function takes the state by value and returns the replacement,
//! so a caller always swaps in a complete new state.

use rand::Rng;
use tracing::{debug, info, warn};

use tierscale_autoscale::{AutoscalePolicy, Autoscaler, ScaleAction};
use tierscale_model::{propagate, sample};
use tierscale_state::*;

/// Default state at process start.
pub fn initialize() -> SimulationState {
    SimulationState::default()
}

/// Runs the architecture model and the autoscaler for one tick.
#[derive(Debug, Clone, Default)]
pub struct TickEngine {
    autoscaler: Autoscaler,
}

impl TickEngine {
    pub fn new(policy: AutoscalePolicy) -> Self {
        Self {
            autoscaler: Autoscaler::new(policy),
        }
    }

    pub fn autoscaler(&self) -> &Autoscaler {
        &self.autoscaler
    }

    /// Advance one tick: sample noisy traffic around `traffic_level`, then
    /// [`step_with_traffic`](Self::step_with_traffic).
    pub fn step<R: Rng + ?Sized>(
        &self,
        state: SimulationState,
        rng: &mut R,
        timestamp_ms: u64,
    ) -> SimulationState {
        let actual = sample(rng, state.traffic_level);
        self.step_with_traffic(state, actual, timestamp_ms)
    }

    /// Advance one tick with an already-sampled traffic value.
    ///
    /// Propagates load, lets the autoscaler rewrite the topology, appends
    /// one metric sample (recording the counts that served this tick) and
    /// prepends one event per scaling action.
    pub fn step_with_traffic(
        &self,
        mut state: SimulationState,
        actual_traffic: f64,
        timestamp_ms: u64,
    ) -> SimulationState {
        state.enforce_invariants();

        let load = propagate(&state, actual_traffic);
        let plan = self.autoscaler.evaluate(&state, &load);
        let served = state.topology();

        state.actual_traffic = load.actual_traffic;
        state.queue_size = load.next_queue_size;
        state.apply_topology(plan.topology);

        for action in &plan.actions {
            state.push_event(action.kind(), action.message(&plan.topology), timestamp_ms);
        }

        state.tick += 1;
        state.record_sample(MetricSample {
            timestamp_ms,
            tick: state.tick,
            traffic: load.actual_traffic,
            latency_ms: load.latency_ms,
            server_load: load.server_utilization() * 100.0,
            db_load: load.db_utilization * 100.0,
            server_count: served.server_count,
            db_count: served.db_count,
            queue_size: load.next_queue_size,
        });

        if load.is_overloaded() {
            debug!(
                tick = state.tick,
                dropped = load.overloaded_traffic,
                "server tier overloaded, requests timing out"
            );
        }
        debug!(
            tick = state.tick,
            traffic = load.actual_traffic,
            latency_ms = load.latency_ms,
            servers = state.server_count,
            dbs = state.db_count,
            queue = state.has_queue,
            backlog = state.queue_size,
            "tick"
        );

        state
    }
}

/// Check an operator-supplied traffic level without clamping.
pub fn validate_traffic_level(level: f64) -> SimResult<f64> {
    if level.is_finite() && (0.0..=MAX_TRAFFIC_LEVEL).contains(&level) {
        Ok(level)
    } else {
        Err(SimError::InvalidTraffic(level))
    }
}

/// Set the operator traffic target. Takes effect from the next tick.
///
/// Out-of-range values are clamped into `[0, MAX_TRAFFIC_LEVEL]`.
pub fn set_traffic_level(mut state: SimulationState, level: f64) -> SimulationState {
    let clamped = non_negative(level).min(MAX_TRAFFIC_LEVEL);
    if clamped != level {
        warn!(requested = level, applied = clamped, "traffic level clamped");
    }
    state.traffic_level = clamped;
    debug!(traffic_level = clamped, "traffic level set");
    state
}

/// Flip the auto-scaling flag and log the transition.
pub fn toggle_auto_scaling(mut state: SimulationState, timestamp_ms: u64) -> SimulationState {
    state.is_auto_scaling = !state.is_auto_scaling;
    let message = if state.is_auto_scaling {
        "Auto-scaling ENABLED"
    } else {
        "Auto-scaling DISABLED (manual mode)"
    };
    state.push_event(EventKind::Warning, message, timestamp_ms);
    info!(enabled = state.is_auto_scaling, "auto-scaling toggled");
    state
}

/// Restore the default traffic level and topology and clear the event log.
///
/// Keeps the metrics history, the auto-scaling flag, the tick counter and
/// the event id sequence. Calling it twice is the same as calling it once.
pub fn reset(state: SimulationState) -> SimulationState {
    info!(tick = state.tick, "simulation reset");
    let mut logs = state.logs;
    logs.clear();
    SimulationState {
        metrics_history: state.metrics_history,
        logs,
        is_auto_scaling: state.is_auto_scaling,
        tick: state.tick,
        next_event_id: state.next_event_id,
        ..SimulationState::default()
    }
}

/// Restore the baseline topology while keeping the operator's traffic level,
/// history and log.
pub fn normalize(mut state: SimulationState, timestamp_ms: u64) -> SimulationState {
    state.apply_topology(Topology::default());
    state.queue_size = 0.0;
    state.push_event(EventKind::Info, "Architecture normalized to baseline", timestamp_ms);
    info!(traffic_level = state.traffic_level, "architecture normalized");
    state
}

// ── Manual topology overrides ─────────────────────────────────────

fn ensure_manual(state: &SimulationState) -> SimResult<()> {
    if state.is_auto_scaling {
        Err(SimError::AutoScalingActive)
    } else {
        Ok(())
    }
}

fn apply_manual(
    mut state: SimulationState,
    action: ScaleAction,
    next: Topology,
    timestamp_ms: u64,
) -> SimulationState {
    state.apply_topology(next);
    state.push_event(action.kind(), action.message(&next), timestamp_ms);
    info!(?action, "manual topology change");
    state
}

/// Add one application server. Only allowed while auto-scaling is off.
pub fn add_server(state: SimulationState, timestamp_ms: u64) -> SimResult<SimulationState> {
    ensure_manual(&state)?;
    let mut next = state.topology();
    if next.server_count >= MAX_SERVERS {
        return Err(SimError::Bounds {
            resource: Resource::AppServer,
            requested: next.server_count + 1,
            min: 1,
            max: MAX_SERVERS,
        });
    }
    next.server_count += 1;
    Ok(apply_manual(state, ScaleAction::AddServer, next, timestamp_ms))
}

/// Remove one application server. Only allowed while auto-scaling is off.
pub fn remove_server(state: SimulationState, timestamp_ms: u64) -> SimResult<SimulationState> {
    ensure_manual(&state)?;
    let mut next = state.topology();
    if next.server_count <= 1 {
        return Err(SimError::Bounds {
            resource: Resource::AppServer,
            requested: next.server_count.saturating_sub(1),
            min: 1,
            max: MAX_SERVERS,
        });
    }
    next.server_count -= 1;
    Ok(apply_manual(state, ScaleAction::RemoveServer, next, timestamp_ms))
}

/// Add one database read replica. Only allowed while auto-scaling is off.
pub fn add_db(state: SimulationState, timestamp_ms: u64) -> SimResult<SimulationState> {
    ensure_manual(&state)?;
    let mut next = state.topology();
    if next.db_count >= MAX_DBS {
        return Err(SimError::Bounds {
            resource: Resource::Database,
            requested: next.db_count + 1,
            min: 1,
            max: MAX_DBS,
        });
    }
    next.db_count += 1;
    Ok(apply_manual(state, ScaleAction::AddDbReplica, next, timestamp_ms))
}

/// Remove one database read replica. Only allowed while auto-scaling is off.
pub fn remove_db(state: SimulationState, timestamp_ms: u64) -> SimResult<SimulationState> {
    ensure_manual(&state)?;
    let mut next = state.topology();
    if next.db_count <= 1 {
        return Err(SimError::Bounds {
            resource: Resource::Database,
            requested: next.db_count.saturating_sub(1),
            min: 1,
            max: MAX_DBS,
        });
    }
    next.db_count -= 1;
    Ok(apply_manual(state, ScaleAction::RemoveDbReplica, next, timestamp_ms))
}

/// Insert or remove the queue tier. A no-op if already in that shape.
pub fn set_queue(
    state: SimulationState,
    enabled: bool,
    timestamp_ms: u64,
) -> SimResult<SimulationState> {
    ensure_manual(&state)?;
    if state.has_queue == enabled {
        return Ok(state);
    }
    let mut next = state.topology();
    next.has_queue = enabled;
    let action = if enabled {
        ScaleAction::AddQueue
    } else {
        ScaleAction::RemoveQueue
    };
    Ok(apply_manual(state, action, next, timestamp_ms))
}

//! Autoscaler: load-driven topology scaling.
//!
//! Evaluates one tick's [`TickLoad`] against the topology the tick started
//! with and emits a [`ScalingPlan`]: the topology for the next tick and the
//! actions that produced it. Applying the plan (and logging events) is the
//! engine's job.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tierscale_model::TickLoad;
use tierscale_state::{EventKind, MAX_DBS, MAX_SERVERS, SimulationState, Topology};

use crate::policy::AutoscalePolicy;

/// A single scaling step taken by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleAction {
    AddServer,
    RemoveServer,
    AddQueue,
    RemoveQueue,
    AddDbReplica,
    RemoveDbReplica,
}

impl ScaleAction {
    /// Severity of the event logged for this action.
    pub fn kind(self) -> EventKind {
        match self {
            ScaleAction::AddServer | ScaleAction::AddDbReplica => EventKind::Success,
            ScaleAction::AddQueue => EventKind::Warning,
            ScaleAction::RemoveServer
            | ScaleAction::RemoveQueue
            | ScaleAction::RemoveDbReplica => EventKind::Info,
        }
    }

    /// Human-readable event message, given the topology after the action.
    pub fn message(self, after: &Topology) -> String {
        match self {
            ScaleAction::AddServer => format!(
                "Scaling UP: Added App Server (Total: {})",
                after.server_count
            ),
            ScaleAction::RemoveServer => format!(
                "Scaling DOWN: Removed App Server (Total: {})",
                after.server_count
            ),
            ScaleAction::AddQueue => {
                "Architecture Change: Added Message Queue to buffer DB writes".to_string()
            }
            ScaleAction::RemoveQueue => {
                "Architecture Change: Removed Message Queue (load normalized)".to_string()
            }
            ScaleAction::AddDbReplica => format!(
                "Scaling UP: Added DB Read Replica (Total: {})",
                after.db_count
            ),
            ScaleAction::RemoveDbReplica => format!(
                "Scaling DOWN: Removed DB Read Replica (Total: {})",
                after.db_count
            ),
        }
    }
}

/// The controller's output for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingPlan {
    /// Topology for the next tick.
    pub topology: Topology,
    /// Actions in rule order: servers, queue, databases.
    pub actions: Vec<ScaleAction>,
}

impl ScalingPlan {
    fn unchanged(topology: Topology) -> Self {
        Self {
            topology,
            actions: Vec::new(),
        }
    }

    /// True when nothing changes.
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }
}

/// The autoscaler evaluates tick loads and decides whether to add or
/// remove servers, databases, or the queue tier.
#[derive(Debug, Clone, Default)]
pub struct Autoscaler {
    policy: AutoscalePolicy,
}

impl Autoscaler {
    /// Create an autoscaler with the given thresholds.
    pub fn new(policy: AutoscalePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AutoscalePolicy {
        &self.policy
    }

    /// Evaluate one tick and return the scaling plan.
    ///
    /// Rules read only `state`'s counts and `load`; no rule sees the result
    /// of an earlier one. A scale-up condition that holds at the upper bound
    /// still suppresses the matching scale-down. With auto-scaling disabled
    /// the topology passes through unchanged.
    pub fn evaluate(&self, state: &SimulationState, load: &TickLoad) -> ScalingPlan {
        let current = state.topology().clamped();
        if !state.is_auto_scaling {
            return ScalingPlan::unchanged(current);
        }

        let policy = &self.policy;
        let mut next = current;
        let mut actions = Vec::new();

        // Servers.
        let server_cap = load.max_server_capacity;
        if load.server_load > server_cap * policy.server_scale_up {
            if current.server_count < MAX_SERVERS {
                next.server_count = current.server_count + 1;
                actions.push(ScaleAction::AddServer);
            }
        } else if load.server_load < server_cap * policy.server_scale_down
            && current.server_count > 1
        {
            next.server_count = current.server_count - 1;
            actions.push(ScaleAction::RemoveServer);
        }

        // Queue tier.
        if load.db_utilization > policy.queue_add_db_utilization && !current.has_queue {
            next.has_queue = true;
            actions.push(ScaleAction::AddQueue);
        } else if load.db_utilization < policy.queue_remove_db_utilization
            && current.has_queue
            && load.queue_before == 0.0
            && load.next_queue_size == 0.0
        {
            next.has_queue = false;
            actions.push(ScaleAction::RemoveQueue);
        }

        // Databases.
        if current.has_queue && load.queue_before > policy.db_scale_up_backlog {
            if current.db_count < MAX_DBS {
                next.db_count = current.db_count + 1;
                actions.push(ScaleAction::AddDbReplica);
            }
        } else if load.db_utilization < policy.db_scale_down_utilization
            && current.db_count > 1
        {
            next.db_count = current.db_count - 1;
            actions.push(ScaleAction::RemoveDbReplica);
        }

        let next = next.clamped();

        if actions.is_empty() {
            debug!(
                servers = current.server_count,
                dbs = current.db_count,
                queue = current.has_queue,
                server_util = load.server_utilization(),
                db_util = load.db_utilization,
                "no scaling needed"
            );
        } else {
            info!(
                ?actions,
                servers_from = current.server_count,
                servers_to = next.server_count,
                dbs_from = current.db_count,
                dbs_to = next.db_count,
                queue_from = current.has_queue,
                queue_to = next.has_queue,
                "scaling topology"
            );
        }

        ScalingPlan {
            topology: next,
            actions,
        }
    }
}

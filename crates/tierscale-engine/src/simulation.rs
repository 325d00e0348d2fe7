//! The owned simulation: state, step engine, noise source and clock.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use tierscale_autoscale::AutoscalePolicy;
use tierscale_state::{SimResult, SimulationState};

use crate::clock::{Clock, SystemClock};
use crate::config::SimulationConfig;
use crate::ops::{self, TickEngine};

/// An operator command that rewrites the state between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    SetTrafficLevel { level: f64 },
    ToggleAutoScaling,
    Reset,
    Normalize,
    AddServer,
    RemoveServer,
    AddDb,
    RemoveDb,
    SetQueue { enabled: bool },
}

/// Single owner of a [`SimulationState`].
///
/// Every tick and every command replaces the state wholesale.
pub struct Simulation {
    state: SimulationState,
    engine: TickEngine,
    rng: StdRng,
    clock: Box<dyn Clock>,
}

impl Simulation {
    /// Build a simulation from config, using wall-clock timestamps.
    pub fn new(config: &SimulationConfig, policy: AutoscalePolicy) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut state = ops::set_traffic_level(ops::initialize(), config.initial_traffic);
        state.is_auto_scaling = config.auto_scaling;

        info!(
            seed = ?config.seed,
            traffic_level = state.traffic_level,
            auto_scaling = state.is_auto_scaling,
            "simulation initialized"
        );

        Self::from_parts(state, TickEngine::new(policy), rng, Box::new(SystemClock))
    }

    /// Assemble a simulation from explicit parts (deterministic runs, tests).
    pub fn from_parts(
        state: SimulationState,
        engine: TickEngine,
        rng: StdRng,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            state,
            engine,
            rng,
            clock,
        }
    }

    /// Replace the timestamp source.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Advance one tick and return the new state.
    pub fn tick(&mut self) -> &SimulationState {
        let now = self.clock.now_ms();
        let prev = std::mem::take(&mut self.state);
        self.state = self.engine.step(prev, &mut self.rng, now);
        &self.state
    }

    /// Apply an operator command.
    ///
    /// On error the state is left untouched.
    pub fn apply(&mut self, command: Command) -> SimResult<&SimulationState> {
        let now = self.clock.now_ms();
        let prev = self.state.clone();
        let next = match command {
            Command::SetTrafficLevel { level } => Ok(ops::set_traffic_level(prev, level)),
            Command::ToggleAutoScaling => Ok(ops::toggle_auto_scaling(prev, now)),
            Command::Reset => Ok(ops::reset(prev)),
            Command::Normalize => Ok(ops::normalize(prev, now)),
            Command::AddServer => ops::add_server(prev, now),
            Command::RemoveServer => ops::remove_server(prev, now),
            Command::AddDb => ops::add_db(prev, now),
            Command::RemoveDb => ops::remove_db(prev, now),
            Command::SetQueue { enabled } => ops::set_queue(prev, enabled, now),
        }?;
        self.state = next;
        Ok(&self.state)
    }
}

//! Tick driver: the background task that owns the simulation.
//!
//! The driver is the only writer. Commands arrive over an `mpsc` channel and
//! are applied between ticks; every replacement state is published as an
//! `Arc` snapshot on a `watch` channel, so readers never observe a partially
//! updated state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use tierscale_state::{SimResult, SimulationState};

use crate::error::{DriverError, DriverResult};
use crate::simulation::{Command, Simulation};

const COMMAND_BUFFER: usize = 64;

type Snapshot = Arc<SimulationState>;

enum DriverMessage {
    Apply {
        command: Command,
        reply: oneshot::Sender<SimResult<Snapshot>>,
    },
    SetPlaying {
        playing: bool,
        reply: oneshot::Sender<()>,
    },
    Step {
        reply: oneshot::Sender<Snapshot>,
    },
}

/// Owns a [`Simulation`] and advances it on a fixed interval while playing.
pub struct TickDriver {
    sim: Simulation,
    interval: Duration,
    commands: mpsc::Receiver<DriverMessage>,
    snapshots: watch::Sender<Snapshot>,
    playing: watch::Sender<bool>,
}

/// Cloneable handle for sending commands to a running [`TickDriver`] and
/// reading its latest snapshot.
#[derive(Clone)]
pub struct DriverHandle {
    commands: mpsc::Sender<DriverMessage>,
    snapshots: watch::Receiver<Snapshot>,
    playing: watch::Receiver<bool>,
}

impl TickDriver {
    /// Create a driver and its handle. Nothing ticks until [`run`](Self::run).
    pub fn new(sim: Simulation, interval: Duration, start_playing: bool) -> (Self, DriverHandle) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshots_tx, snapshots_rx) = watch::channel(Arc::new(sim.state().clone()));
        let (playing_tx, playing_rx) = watch::channel(start_playing);

        let driver = Self {
            sim,
            interval,
            commands: commands_rx,
            snapshots: snapshots_tx,
            playing: playing_tx,
        };
        let handle = DriverHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
            playing: playing_rx,
        };
        (driver, handle)
    }

    /// Run until `shutdown` flips or every handle is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_ms = self.interval.as_millis() as u64,
            playing = *self.playing.borrow(),
            "tick driver started"
        );

        loop {
            let playing = *self.playing.borrow();
            tokio::select! {
                _ = ticker.tick(), if playing => {
                    self.tick();
                }
                message = self.commands.recv() => {
                    match message {
                        Some(message) => self.handle(message, &mut ticker),
                        None => {
                            debug!("all driver handles dropped");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("tick driver shutting down");
                    break;
                }
            }
        }
    }

    fn tick(&mut self) -> Snapshot {
        let snapshot = Arc::new(self.sim.tick().clone());
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    fn handle(&mut self, message: DriverMessage, ticker: &mut tokio::time::Interval) {
        match message {
            DriverMessage::Apply { command, reply } => {
                let result = match self.sim.apply(command) {
                    Ok(state) => {
                        let snapshot = Arc::new(state.clone());
                        self.snapshots.send_replace(snapshot.clone());
                        Ok(snapshot)
                    }
                    Err(e) => {
                        warn!(?command, error = %e, "command rejected");
                        Err(e)
                    }
                };
                let _ = reply.send(result);
            }
            DriverMessage::SetPlaying { playing, reply } => {
                let was_playing = self.playing.send_replace(playing);
                if playing && !was_playing {
                    // First tick one full interval after resuming.
                    ticker.reset();
                }
                if playing != was_playing {
                    info!(playing, "tick driver {}", if playing { "resumed" } else { "paused" });
                }
                let _ = reply.send(());
            }
            DriverMessage::Step { reply } => {
                let snapshot = self.tick();
                debug!(tick = snapshot.tick, "manual step");
                let _ = reply.send(snapshot);
            }
        }
    }
}

impl DriverHandle {
    /// The most recently published state.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified on every published state.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    pub fn is_playing(&self) -> bool {
        *self.playing.borrow()
    }

    /// Apply a command and wait for the resulting snapshot.
    pub async fn apply(&self, command: Command) -> DriverResult<Snapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(DriverMessage::Apply { command, reply }).await?;
        Ok(rx.await.map_err(|_| DriverError::Closed)??)
    }

    pub async fn play(&self) -> DriverResult<()> {
        self.set_playing(true).await
    }

    pub async fn pause(&self) -> DriverResult<()> {
        self.set_playing(false).await
    }

    /// Advance exactly one tick, regardless of play state.
    pub async fn step(&self) -> DriverResult<Snapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(DriverMessage::Step { reply }).await?;
        rx.await.map_err(|_| DriverError::Closed)
    }

    async fn set_playing(&self, playing: bool) -> DriverResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(DriverMessage::SetPlaying { playing, reply }).await?;
        rx.await.map_err(|_| DriverError::Closed)
    }

    async fn send(&self, message: DriverMessage) -> DriverResult<()> {
        self.commands
            .send(message)
            .await
            .map_err(|_| DriverError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use crate::ops::TickEngine;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tierscale_state::SimError;

    const INTERVAL: Duration = Duration::from_millis(1000);

    fn spawn_driver(start_playing: bool) -> (DriverHandle, watch::Sender<bool>, tokio::task::JoinHandle<()>) {
        let sim = Simulation::from_parts(
            SimulationState::default(),
            TickEngine::default(),
            StdRng::seed_from_u64(11),
            Box::new(VirtualClock::new(0, 1000)),
        );
        let (driver, handle) = TickDriver::new(sim, INTERVAL, start_playing);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(driver.run(shutdown_rx));
        (handle, shutdown_tx, task)
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_snapshot_per_tick() {
        let (handle, _shutdown, _task) = spawn_driver(true);
        let mut rx = handle.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().tick, 1);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().tick, 2);
        assert_eq!(handle.snapshot().metrics_history.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_driver_does_not_tick() {
        let (handle, _shutdown, _task) = spawn_driver(false);
        assert!(!handle.is_playing());

        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(handle.snapshot().tick, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_apply_while_paused() {
        let (handle, _shutdown, _task) = spawn_driver(false);

        let snapshot = handle
            .apply(Command::SetTrafficLevel { level: 500.0 })
            .await
            .unwrap();
        assert_eq!(snapshot.traffic_level, 500.0);
        assert_eq!(handle.snapshot().traffic_level, 500.0);
        assert_eq!(snapshot.tick, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_command_reports_error() {
        let (handle, _shutdown, _task) = spawn_driver(false);

        let err = handle.apply(Command::AddServer).await.unwrap_err();
        assert!(matches!(err, DriverError::Sim(SimError::AutoScalingActive)));
        assert_eq!(handle.snapshot().server_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn step_advances_once_while_paused() {
        let (handle, _shutdown, _task) = spawn_driver(false);

        let snapshot = handle.step().await.unwrap();
        assert_eq!(snapshot.tick, 1);
        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(handle.snapshot().tick, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn play_and_pause_toggle_ticking() {
        let (handle, _shutdown, _task) = spawn_driver(false);

        handle.play().await.unwrap();
        assert!(handle.is_playing());
        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().tick >= 1);

        handle.pause().await.unwrap();
        let paused_at = handle.snapshot().tick;
        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(handle.snapshot().tick, paused_at);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_task() {
        let (handle, shutdown, task) = spawn_driver(true);

        shutdown.send(true).unwrap();
        task.await.unwrap();
        assert!(matches!(handle.step().await, Err(DriverError::Closed)));
    }

    #[tokio::test]
    async fn handle_without_driver_is_closed() {
        let sim = Simulation::from_parts(
            SimulationState::default(),
            TickEngine::default(),
            StdRng::seed_from_u64(1),
            Box::new(VirtualClock::new(0, 1)),
        );
        let (driver, handle) = TickDriver::new(sim, INTERVAL, false);
        drop(driver);
        assert!(matches!(
            handle.apply(Command::Reset).await,
            Err(DriverError::Closed)
        ));
    }
}

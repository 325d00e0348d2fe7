//! Headless runs: a fixed number of ticks on a virtual clock, one JSON line
//! per tick.

use std::io::Write;

use serde::Serialize;
use tracing::info;

use tierscale_autoscale::AutoscalePolicy;
use tierscale_engine::{Simulation, SimulationConfig, VirtualClock};
use tierscale_state::{EventId, MetricSample, ScalingEvent};

/// Seed used when neither the CLI nor the config provides one.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Serialize)]
struct TickRecord<'a> {
    tick: u64,
    sample: Option<&'a MetricSample>,
    server_count: u32,
    db_count: u32,
    has_queue: bool,
    queue_size: f64,
    /// Events emitted during this tick, newest first.
    events: Vec<&'a ScalingEvent>,
}

/// Run `ticks` ticks and write one JSON line per tick to `out`.
///
/// Timestamps come from a virtual clock starting at 0 and advancing by the
/// configured tick interval, so the same seed always yields the same output.
pub fn run<W: Write>(
    config: &SimulationConfig,
    policy: AutoscalePolicy,
    ticks: u64,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut config = config.clone();
    let seed = *config.seed.get_or_insert(DEFAULT_SEED);
    let mut sim = Simulation::new(&config, policy)
        .with_clock(Box::new(VirtualClock::new(0, config.tick_interval_ms)));

    info!(ticks, seed, "headless run starting");

    for _ in 0..ticks {
        let first_new = EventId::new(sim.state().next_event_id);
        let state = sim.tick();
        let record = TickRecord {
            tick: state.tick,
            sample: state.latest_sample(),
            server_count: state.server_count,
            db_count: state.db_count,
            has_queue: state.has_queue,
            queue_size: state.queue_size,
            events: state.logs.iter().take_while(|e| e.id >= first_new).collect(),
        };
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
    }
    out.flush()?;

    let state = sim.state();
    info!(
        ticks = state.tick,
        servers = state.server_count,
        dbs = state.db_count,
        queue = state.has_queue,
        "headless run finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_string(config: &SimulationConfig, ticks: u64) -> String {
        let mut out = Vec::new();
        run(config, AutoscalePolicy::default(), ticks, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn one_line_per_tick() {
        let output = run_to_string(&SimulationConfig::default(), 25);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 25);

        let last: serde_json::Value = serde_json::from_str(lines[24]).unwrap();
        assert_eq!(last["tick"], 25);
        assert_eq!(last["sample"]["timestamp_ms"], 24_000);
    }

    #[test]
    fn same_seed_same_output() {
        let config = SimulationConfig {
            seed: Some(9),
            initial_traffic: 900.0,
            ..Default::default()
        };
        assert_eq!(run_to_string(&config, 40), run_to_string(&config, 40));
    }

    #[test]
    fn scaling_events_attach_to_their_tick() {
        let config = SimulationConfig {
            seed: Some(1),
            initial_traffic: 1000.0,
            ..Default::default()
        };
        let output = run_to_string(&config, 1);
        let record: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        let events = record["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["kind"], "SUCCESS");
        assert_eq!(record["server_count"], 2);
    }
}

//! tierscaled: the tierscale daemon.
//!
//! Single binary that assembles the simulation subsystems:
//! - Simulation (architecture model + autoscaler)
//! - Tick driver
//! - Advisory gate
//! - REST API + Prometheus metrics
//!
//! # Usage
//!
//! ```text
//! tierscaled serve --port 8080 --seed 42
//! tierscaled simulate --ticks 120 --traffic 900 > run.jsonl
//! ```

mod config;
mod headless;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tierscale_advisor::AdvisoryGate;
use tierscale_api::{ApiState, build_router};
use tierscale_engine::{Simulation, TickDriver};

use crate::config::TierscaleConfig;

const DEFAULT_LOG_FILTER: &str = "info,tierscaled=debug,tierscale=debug";

#[derive(Parser)]
#[command(name = "tierscaled", about = "Three-tier architecture simulator with autoscaling")]
struct Cli {
    /// Path to the config file (defaults to ./tierscale.toml when present).
    #[arg(long, global = true, env = "TIERSCALE_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the tick driver and serve the REST API.
    Serve {
        /// Port to listen on.
        #[arg(long)]
        port: Option<u16>,

        /// RNG seed for the traffic noise.
        #[arg(long)]
        seed: Option<u64>,

        /// Milliseconds between ticks.
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Start paused; resume with POST /api/v1/play.
        #[arg(long)]
        paused: bool,

        /// Advisor endpoint (`host:port`).
        #[arg(long, env = "TIERSCALE_ADVISOR_ENDPOINT")]
        advisor_endpoint: Option<String>,
    },

    /// Run a fixed number of ticks headless and print one JSON line per tick.
    Simulate {
        /// Number of ticks to run.
        #[arg(long, default_value = "60")]
        ticks: u64,

        /// RNG seed for the traffic noise.
        #[arg(long)]
        seed: Option<u64>,

        /// Traffic level in requests per second.
        #[arg(long)]
        traffic: Option<f64>,

        /// Disable the autoscaler.
        #[arg(long)]
        manual: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // Logs go to stderr so `simulate` output stays machine-readable.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = TierscaleConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve {
            port,
            seed,
            tick_ms,
            paused,
            advisor_endpoint,
        } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if seed.is_some() {
                config.simulation.seed = seed;
            }
            if let Some(tick_ms) = tick_ms {
                config.simulation.tick_interval_ms = tick_ms;
            }
            if paused {
                config.simulation.start_playing = false;
            }
            if advisor_endpoint.is_some() {
                config.advisor.endpoint = advisor_endpoint;
            }
            config.validate()?;
            run_serve(config).await
        }
        Command::Simulate {
            ticks,
            seed,
            traffic,
            manual,
        } => {
            if seed.is_some() {
                config.simulation.seed = seed;
            }
            if let Some(traffic) = traffic {
                config.simulation.initial_traffic = traffic;
            }
            if manual {
                config.simulation.auto_scaling = false;
            }
            config.validate()?;
            let stdout = std::io::stdout();
            headless::run(&config.simulation, config.autoscale, ticks, &mut stdout.lock())
        }
    }
}

async fn run_serve(config: TierscaleConfig) -> anyhow::Result<()> {
    info!("tierscale daemon starting");

    // ── Initialize subsystems ──────────────────────────────────

    let sim = Simulation::new(&config.simulation, config.autoscale.clone());
    let (driver, handle) = TickDriver::new(
        sim,
        config.simulation.tick_interval(),
        config.simulation.start_playing,
    );
    info!(
        interval_ms = config.simulation.tick_interval_ms,
        "tick driver initialized"
    );

    let advisor = AdvisoryGate::new(tierscale_advisor::from_config(&config.advisor));

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    let driver_handle = tokio::spawn(driver.run(shutdown_rx));

    // ── Start API server ───────────────────────────────────────

    let router = build_router(ApiState {
        driver: handle,
        advisor,
    });
    let addr = config.server.addr();

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c, shutting down");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    let _ = driver_handle.await;

    info!("tierscale daemon stopped");
    Ok(())
}

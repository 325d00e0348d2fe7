//! tierscale-api: REST API for a running simulation.
//!
//! Provides axum route handlers that read the tick driver's snapshots,
//! forward operator commands to it, and request advisory reports.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/state` | Latest simulation snapshot |
//! | GET | `/api/v1/metrics` | Metrics history and window summary |
//! | GET | `/api/v1/logs` | Event log, newest first |
//! | POST | `/api/v1/traffic` | Set the traffic level (`{"level": f64}`) |
//! | POST | `/api/v1/autoscaling/toggle` | Toggle auto-scaling |
//! | POST | `/api/v1/reset` | Reset to defaults |
//! | POST | `/api/v1/normalize` | Restore the baseline topology |
//! | POST | `/api/v1/commands` | Apply any operator command |
//! | POST | `/api/v1/play` | Resume ticking |
//! | POST | `/api/v1/pause` | Stop ticking |
//! | POST | `/api/v1/step` | Advance one tick |
//! | POST | `/api/v1/advice` | Advisory report (409 while one is running) |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};

use tierscale_advisor::AdvisoryGate;
use tierscale_engine::DriverHandle;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub driver: DriverHandle,
    pub advisor: AdvisoryGate,
}

/// Build the complete API router (REST + metrics).
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/state", get(handlers::get_state))
        .route("/metrics", get(handlers::get_metrics))
        .route("/logs", get(handlers::get_logs))
        .route("/traffic", post(handlers::set_traffic))
        .route("/autoscaling/toggle", post(handlers::toggle_auto_scaling))
        .route("/reset", post(handlers::reset))
        .route("/normalize", post(handlers::normalize))
        .route("/commands", post(handlers::apply_command))
        .route("/play", post(handlers::play))
        .route("/pause", post(handlers::pause))
        .route("/step", post(handlers::step))
        .route("/advice", post(handlers::request_advice))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::prometheus_metrics).with_state(state))
}

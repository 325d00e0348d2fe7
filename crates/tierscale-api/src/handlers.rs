//! REST API handlers.
//!
//! Reads come from the driver's latest snapshot; writes go through the
//! driver as commands and return the resulting snapshot.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use tierscale_advisor::{AdvisoryOutcome, AdvisorySnapshot};
use tierscale_engine::{Command, DriverError, DriverResult, validate_traffic_level};
use tierscale_metrics::WindowSummary;
use tierscale_state::{MetricSample, ScalingEvent, SimError, SimulationState};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

fn status_for(err: &DriverError) -> StatusCode {
    match err {
        DriverError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        DriverError::Sim(SimError::InvalidTraffic(_)) => StatusCode::BAD_REQUEST,
        DriverError::Sim(SimError::Bounds { .. } | SimError::AutoScalingActive) => {
            StatusCode::CONFLICT
        }
    }
}

fn respond<T: Serialize>(result: DriverResult<T>) -> Response {
    match result {
        Ok(data) => ApiResponse::ok(data).into_response(),
        Err(e) => error_response(&e.to_string(), status_for(&e)),
    }
}

async fn run_command(state: &ApiState, command: Command) -> Response {
    debug!(?command, "operator command");
    respond(
        state
            .driver
            .apply(command)
            .await
            .map(|snapshot| SimulationState::clone(&snapshot)),
    )
}

// ── Reads ──────────────────────────────────────────────────────

/// GET /api/v1/state
pub async fn get_state(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.driver.snapshot();
    ApiResponse::ok(SimulationState::clone(&snapshot))
}

/// Metrics history plus aggregates over it.
#[derive(Debug, Serialize)]
pub struct MetricsView {
    pub samples: Vec<MetricSample>,
    pub summary: WindowSummary,
}

/// GET /api/v1/metrics
pub async fn get_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.driver.snapshot();
    ApiResponse::ok(MetricsView {
        samples: snapshot.metrics_history.iter().cloned().collect(),
        summary: WindowSummary::from_history(&snapshot.metrics_history),
    })
}

/// GET /api/v1/logs
pub async fn get_logs(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.driver.snapshot();
    let logs: Vec<ScalingEvent> = snapshot.logs.iter().cloned().collect();
    ApiResponse::ok(logs)
}

// ── Operator commands ──────────────────────────────────────────

/// Traffic request body.
#[derive(Debug, Deserialize)]
pub struct TrafficRequest {
    pub level: f64,
}

/// POST /api/v1/traffic
pub async fn set_traffic(
    State(state): State<ApiState>,
    Json(req): Json<TrafficRequest>,
) -> Response {
    match validate_traffic_level(req.level) {
        Ok(level) => run_command(&state, Command::SetTrafficLevel { level }).await,
        Err(e) => error_response(&e.to_string(), StatusCode::BAD_REQUEST),
    }
}

/// POST /api/v1/autoscaling/toggle
pub async fn toggle_auto_scaling(State(state): State<ApiState>) -> Response {
    run_command(&state, Command::ToggleAutoScaling).await
}

/// POST /api/v1/reset
pub async fn reset(State(state): State<ApiState>) -> Response {
    run_command(&state, Command::Reset).await
}

/// POST /api/v1/normalize
pub async fn normalize(State(state): State<ApiState>) -> Response {
    run_command(&state, Command::Normalize).await
}

/// POST /api/v1/commands
pub async fn apply_command(
    State(state): State<ApiState>,
    Json(command): Json<Command>,
) -> Response {
    if let Command::SetTrafficLevel { level } = command {
        if let Err(e) = validate_traffic_level(level) {
            return error_response(&e.to_string(), StatusCode::BAD_REQUEST);
        }
    }
    run_command(&state, command).await
}

// ── Driver control ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PlayState {
    pub playing: bool,
}

/// POST /api/v1/play
pub async fn play(State(state): State<ApiState>) -> Response {
    respond(
        state
            .driver
            .play()
            .await
            .map(|()| PlayState { playing: true }),
    )
}

/// POST /api/v1/pause
pub async fn pause(State(state): State<ApiState>) -> Response {
    respond(
        state
            .driver
            .pause()
            .await
            .map(|()| PlayState { playing: false }),
    )
}

/// POST /api/v1/step
pub async fn step(State(state): State<ApiState>) -> Response {
    respond(
        state
            .driver
            .step()
            .await
            .map(|snapshot| SimulationState::clone(&snapshot)),
    )
}

// ── Advisory ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AdviceView {
    pub report: String,
    pub snapshot: AdvisorySnapshot,
}

/// POST /api/v1/advice
pub async fn request_advice(State(state): State<ApiState>) -> Response {
    let snapshot = AdvisorySnapshot::from(&*state.driver.snapshot());
    match state.advisor.request(snapshot.clone()).await {
        AdvisoryOutcome::Report(report) => ApiResponse::ok(AdviceView { report, snapshot }).into_response(),
        AdvisoryOutcome::Busy => error_response(
            "an advisory report is already being generated",
            StatusCode::CONFLICT,
        ),
    }
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = tierscale_metrics::render_prometheus(&state.driver.snapshot());
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tierscale_advisor::{AdvisoryGate, DisabledAdvisor, NOT_CONFIGURED_MESSAGE};
    use tierscale_autoscale::AutoscalePolicy;
    use tierscale_engine::{Simulation, SimulationConfig, TickDriver};
    use tokio::sync::watch;

    async fn body_json(resp: Response) -> serde_json::Value {
        use http_body_util::BodyExt;
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// A paused driver so only explicit commands change the state.
    fn test_state() -> (ApiState, watch::Sender<bool>) {
        let config = SimulationConfig {
            seed: Some(3),
            start_playing: false,
            ..Default::default()
        };
        let sim = Simulation::new(&config, AutoscalePolicy::default());
        let (driver, handle) = TickDriver::new(sim, Duration::from_secs(1), false);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(driver.run(shutdown_rx));
        let state = ApiState {
            driver: handle,
            advisor: AdvisoryGate::new(Arc::new(DisabledAdvisor)),
        };
        (state, shutdown_tx)
    }

    #[tokio::test]
    async fn get_state_returns_snapshot() {
        let (state, _shutdown) = test_state();
        let resp = get_state(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["server_count"], 1);
        assert_eq!(body["data"]["traffic_level"], 100.0);
    }

    #[tokio::test]
    async fn set_traffic_applies_level() {
        let (state, _shutdown) = test_state();
        let resp = set_traffic(State(state.clone()), Json(TrafficRequest { level: 640.0 })).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.driver.snapshot().traffic_level, 640.0);
    }

    #[tokio::test]
    async fn set_traffic_rejects_negative() {
        let (state, _shutdown) = test_state();
        let resp = set_traffic(State(state.clone()), Json(TrafficRequest { level: -5.0 })).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(state.driver.snapshot().traffic_level, 100.0);
    }

    #[tokio::test]
    async fn manual_command_conflicts_while_auto_scaling() {
        let (state, _shutdown) = test_state();
        let resp = apply_command(State(state), Json(Command::AddServer)).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn manual_commands_after_toggle() {
        let (state, _shutdown) = test_state();
        let resp = toggle_auto_scaling(State(state.clone())).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = apply_command(State(state.clone()), Json(Command::AddDb)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["db_count"], 2);
        assert_eq!(body["data"]["is_auto_scaling"], false);
    }

    #[tokio::test]
    async fn step_and_read_metrics() {
        let (state, _shutdown) = test_state();
        step(State(state.clone())).await;
        step(State(state.clone())).await;

        let body = body_json(get_metrics(State(state.clone())).await.into_response()).await;
        assert_eq!(body["data"]["samples"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["summary"]["samples"], 2);
        assert_eq!(body["data"]["summary"]["last_tick"], 2);
    }

    #[tokio::test]
    async fn logs_are_newest_first() {
        let (state, _shutdown) = test_state();
        toggle_auto_scaling(State(state.clone())).await;
        normalize(State(state.clone())).await;

        let body = body_json(get_logs(State(state)).await.into_response()).await;
        let logs = body["data"].as_array().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0]["message"], "Architecture normalized to baseline");
        assert_eq!(logs[1]["kind"], "WARNING");
    }

    #[tokio::test]
    async fn play_and_pause_report_state() {
        let (state, _shutdown) = test_state();
        let body = body_json(play(State(state.clone())).await).await;
        assert_eq!(body["data"]["playing"], true);
        assert!(state.driver.is_playing());

        let body = body_json(pause(State(state.clone())).await).await;
        assert_eq!(body["data"]["playing"], false);
        assert!(!state.driver.is_playing());
    }

    #[tokio::test]
    async fn advice_without_endpoint_returns_fallback() {
        let (state, _shutdown) = test_state();
        let resp = request_advice(State(state)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["report"], NOT_CONFIGURED_MESSAGE);
        assert_eq!(body["data"]["snapshot"]["server_count"], 1);
    }

    #[tokio::test]
    async fn closed_driver_is_unavailable() {
        let (state, shutdown) = test_state();
        shutdown.send(true).unwrap();
        // Wait for the driver task to observe shutdown and drop its receiver.
        while state.driver.step().await.is_ok() {
            tokio::task::yield_now().await;
        }
        let resp = reset(State(state)).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn prometheus_endpoint_returns_text() {
        let (state, _shutdown) = test_state();
        let resp = prometheus_metrics(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("text/plain"));
    }
}

//! Prometheus text exposition format.
//!
//! Renders a simulation snapshot into the Prometheus text exposition format
//! for scraping by a Prometheus server or compatible agent.

use std::fmt::Write;

use tierscale_state::{EventKind, SimulationState};

use crate::summary::WindowSummary;

fn header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
}

fn gauge(out: &mut String, name: &str, help: &str, value: f64) {
    header(out, name, help, "gauge");
    let _ = writeln!(out, "{name} {value:.2}");
}

/// Render the latest snapshot into Prometheus text format.
///
/// Per-tick values come from the newest metric sample; before the first
/// tick they render as zero.
pub fn render_prometheus(state: &SimulationState) -> String {
    let mut out = String::new();
    let latest = state.latest_sample();
    let window = WindowSummary::from_history(&state.metrics_history);

    header(&mut out, "tierscale_ticks_total", "Ticks simulated since start.", "counter");
    let _ = writeln!(out, "tierscale_ticks_total {}", state.tick);

    gauge(
        &mut out,
        "tierscale_traffic_level",
        "Operator traffic target in requests per second.",
        state.traffic_level,
    );
    gauge(
        &mut out,
        "tierscale_actual_traffic",
        "Traffic that reached the load balancer on the last tick.",
        state.actual_traffic,
    );
    gauge(
        &mut out,
        "tierscale_latency_ms",
        "Modeled latency of the last tick in milliseconds.",
        latest.map_or(0.0, |s| s.latency_ms),
    );

    header(
        &mut out,
        "tierscale_tier_load_percent",
        "Utilization of each tier on the last tick.",
        "gauge",
    );
    for (tier, value) in [
        ("app_server", latest.map_or(0.0, |s| s.server_load)),
        ("database", latest.map_or(0.0, |s| s.db_load)),
    ] {
        let _ = writeln!(out, "tierscale_tier_load_percent{{tier=\"{tier}\"}} {value:.2}");
    }

    header(
        &mut out,
        "tierscale_instances",
        "Provisioned instances per tier.",
        "gauge",
    );
    for (tier, count) in [("app_server", state.server_count), ("database", state.db_count)] {
        let _ = writeln!(out, "tierscale_instances{{tier=\"{tier}\"}} {count}");
    }

    header(
        &mut out,
        "tierscale_queue_enabled",
        "Whether the message queue tier is present (0 or 1).",
        "gauge",
    );
    let _ = writeln!(out, "tierscale_queue_enabled {}", u8::from(state.has_queue));
    gauge(
        &mut out,
        "tierscale_queue_size",
        "Items waiting in the message queue.",
        state.queue_size,
    );

    header(
        &mut out,
        "tierscale_auto_scaling_enabled",
        "Whether the autoscaler owns the topology (0 or 1).",
        "gauge",
    );
    let _ = writeln!(
        out,
        "tierscale_auto_scaling_enabled {}",
        u8::from(state.is_auto_scaling)
    );

    gauge(
        &mut out,
        "tierscale_window_mean_latency_ms",
        "Mean latency over the retained metrics history.",
        window.mean_latency_ms,
    );
    gauge(
        &mut out,
        "tierscale_window_max_latency_ms",
        "Maximum latency over the retained metrics history.",
        window.max_latency_ms,
    );
    header(
        &mut out,
        "tierscale_window_overloaded_ticks",
        "Ticks in the retained history whose traffic exceeded server capacity.",
        "gauge",
    );
    let _ = writeln!(
        out,
        "tierscale_window_overloaded_ticks {}",
        window.overloaded_ticks
    );

    header(
        &mut out,
        "tierscale_log_events",
        "Events in the retained log by severity.",
        "gauge",
    );
    for kind in [
        EventKind::Info,
        EventKind::Warning,
        EventKind::Error,
        EventKind::Success,
    ] {
        let count = state.logs.iter().filter(|e| e.kind == kind).count();
        let label = kind.to_string().to_lowercase();
        let _ = writeln!(out, "tierscale_log_events{{kind=\"{label}\"}} {count}");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierscale_state::MetricSample;

    fn test_state() -> SimulationState {
        let mut state = SimulationState {
            traffic_level: 450.0,
            actual_traffic: 432.5,
            server_count: 4,
            db_count: 2,
            has_queue: true,
            queue_size: 12.0,
            tick: 7,
            ..Default::default()
        };
        state.record_sample(MetricSample {
            timestamp_ms: 7000,
            tick: 7,
            traffic: 432.5,
            latency_ms: 131.25,
            server_load: 72.08,
            db_load: 54.06,
            server_count: 4,
            db_count: 2,
            queue_size: 12.0,
        });
        state.push_event(EventKind::Success, "Scaling UP: Added App Server (Total: 4)", 6000);
        state.push_event(EventKind::Warning, "Auto-scaling ENABLED", 6500);
        state
    }

    #[test]
    fn render_initial_state() {
        let output = render_prometheus(&SimulationState::default());
        assert!(output.contains("# TYPE tierscale_ticks_total counter"));
        assert!(output.contains("tierscale_ticks_total 0\n"));
        assert!(output.contains("tierscale_latency_ms 0.00"));
        assert!(output.contains("tierscale_instances{tier=\"app_server\"} 1"));
        assert!(output.contains("tierscale_queue_enabled 0"));
    }

    #[test]
    fn render_snapshot_values() {
        let output = render_prometheus(&test_state());

        assert!(output.contains("tierscale_ticks_total 7"));
        assert!(output.contains("tierscale_traffic_level 450.00"));
        assert!(output.contains("tierscale_actual_traffic 432.50"));
        assert!(output.contains("tierscale_latency_ms 131.25"));
        assert!(output.contains("tierscale_tier_load_percent{tier=\"app_server\"} 72.08"));
        assert!(output.contains("tierscale_tier_load_percent{tier=\"database\"} 54.06"));
        assert!(output.contains("tierscale_instances{tier=\"database\"} 2"));
        assert!(output.contains("tierscale_queue_enabled 1"));
        assert!(output.contains("tierscale_queue_size 12.00"));
        assert!(output.contains("tierscale_auto_scaling_enabled 1"));
        assert!(output.contains("tierscale_log_events{kind=\"success\"} 1"));
        assert!(output.contains("tierscale_log_events{kind=\"warning\"} 1"));
        assert!(output.contains("tierscale_log_events{kind=\"error\"} 0"));
    }

    #[test]
    fn render_format_is_prometheus_compatible() {
        let output = render_prometheus(&test_state());

        // Every sample line is `name[{labels}] value` and follows its TYPE line.
        let mut declared = Vec::new();
        for line in output.lines() {
            if let Some(rest) = line.strip_prefix("# TYPE ") {
                declared.push(rest.split_whitespace().next().unwrap().to_string());
                continue;
            }
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (series, value) = line.rsplit_once(' ').unwrap();
            let name = series.split('{').next().unwrap();
            assert!(declared.iter().any(|d| d == name), "undeclared metric: {line}");
            assert!(value.parse::<f64>().is_ok(), "bad value: {line}");
        }
    }
}

//! Structured logging and Prometheus metrics wiring.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber. Call once at process start.
/// Honors `RUST_LOG`, defaulting to `info`. `json` selects
/// `tracing-subscriber`'s JSON formatter for machine-readable log shipping;
/// otherwise the default human-readable formatter is used.
pub fn init_subscriber(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// Install the Prometheus recorder. Must be called once, before any metrics
/// are recorded, and the returned handle kept alive for the life of the
/// process — it backs the `/metrics` render.
pub fn install_recorder() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Metric name constants, to avoid typos across handlers.
pub const TASKS_RUNNING: &str = "edi_tasks_running";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "edi_http_request_duration_seconds";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_and_render_produces_valid_text() {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let output = handle.render();
        assert!(output.is_empty() || output.contains('#') || output.contains('\n'));
    }
}

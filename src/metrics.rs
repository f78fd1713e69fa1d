use anyhow::{Context, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder.
/// Returns a handle that renders the scrape body for `/metrics`.
pub fn init_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        // Buckets: 5ms .. 30s, wide enough to cover the 20s OpenSky timeout
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0],
        )
        .context("failed to set buckets for http_request_duration_seconds")?
        .set_buckets_for_metric(
            Matcher::Full("pipeline_run_duration_seconds".to_string()),
            &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0],
        )
        .context("failed to set buckets for pipeline_run_duration_seconds")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register every counter at zero so dashboards show them before the first event.
pub fn initialize_metrics() {
    metrics::counter!("opensky_fetch_total").absolute(0);
    metrics::counter!("opensky_fetch_errors_total").absolute(0);
    for outcome in ["inserted", "already_exists", "skipped", "failed"] {
        metrics::counter!("sightings_persist_total", "outcome" => outcome).absolute(0);
    }
}

use crate::error::AppError;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

const LATENCY_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];

/// Install the process-wide Prometheus recorder. Call once, from `main`.
pub fn install_metrics_recorder() -> Result<PrometheusHandle, AppError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .and_then(|builder| {
            builder.set_buckets_for_metric(
                Matcher::Suffix("latency_seconds".to_string()),
                LATENCY_BUCKETS,
            )
        })
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid metric buckets: {}", e)))?
        .install_recorder()
        .map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Failed to install metrics recorder: {}", e))
        })
}

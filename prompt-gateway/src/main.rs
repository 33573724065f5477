use prompt_gateway::config::GatewayConfig;
use prompt_gateway::startup::Application;
use service_core::observability::{init_tracing, install_metrics_recorder, shutdown_tracing};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = GatewayConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "prompt-gateway",
        &config.common.log_level,
        config.otlp_endpoint.as_deref(),
    );

    let metrics = match install_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("Metrics disabled: {}", e);
            None
        }
    };

    let app = Application::build(config, metrics).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    let result = app.run_until_stopped().await;
    if let Err(e) = &result {
        tracing::error!("HTTP server error: {}", e);
    }

    shutdown_tracing();
    result
}

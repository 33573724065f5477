use crate::startup::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use service_core::error::AppError;

/// Static greeting served at `/`.
pub async fn root() -> Html<&'static str> {
    Html("<h1>Server Is Running !</h1>")
}

/// Liveness probe. Never calls the model.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "prompt-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.provider.name(),
        "model": state.provider.model(),
    }))
}

/// Readiness probe: the provider must accept our credentials.
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.provider.health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Provider readiness check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(StatusCode::OK)
}

/// Prometheus exposition, when a recorder was installed.
pub async fn metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    let handle = state.metrics.as_ref().ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!("Metrics recorder is not installed"))
    })?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}

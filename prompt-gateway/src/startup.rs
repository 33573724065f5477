//! Application startup and lifecycle management.
//!
//! Everything a request needs is assembled here once and handed to the
//! handlers through [`AppState`]; nothing is mutated afterwards.

use crate::config::{GatewayConfig, ProviderKind};
use crate::handlers;
use crate::models::PersonaInstruction;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::mock::MockTextProvider;
use crate::services::TextProvider;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, Request},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware,
};
use service_core::observability::REQUEST_ID_HEADER;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub persona: PersonaInstruction,
    pub provider: Arc<dyn TextProvider>,
    pub metrics: Option<PrometheusHandle>,
}

/// Construct the provider selected by `GENAI_PROVIDER`.
pub fn build_provider(config: &GatewayConfig) -> Result<Arc<dyn TextProvider>, AppError> {
    let provider: Arc<dyn TextProvider> = match config.models.provider {
        ProviderKind::Gemini => {
            let gemini_config = GeminiConfig {
                api_key: config.google.api_key.clone(),
                model: config.models.text_model.clone(),
                api_base: config.google.api_base.clone(),
                timeout: config.google.timeout,
            };
            let provider = GeminiTextProvider::new(gemini_config)
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

            tracing::info!(
                model = %config.models.text_model,
                "Initialized Gemini text provider"
            );
            Arc::new(provider)
        }
        ProviderKind::Mock => {
            tracing::warn!("GENAI_PROVIDER=mock, responses are not generated by a model");
            Arc::new(MockTextProvider::new())
        }
    };

    Ok(provider)
}

/// Load the persona override, or fall back to the built-in one.
pub async fn load_persona(config: &GatewayConfig) -> Result<PersonaInstruction, AppError> {
    match &config.gateway.persona_path {
        Some(path) => {
            let persona = PersonaInstruction::from_file(path).await.map_err(|e| {
                tracing::error!("Failed to read persona file {}: {}", path, e);
                AppError::ConfigError(anyhow::anyhow!(
                    "Failed to read persona file {}: {}",
                    path,
                    e
                ))
            })?;
            tracing::info!(path = %path, "Loaded persona override");
            Ok(persona)
        }
        None => Ok(PersonaInstruction::builtin()),
    }
}

fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(
            config
                .gateway
                .allowed_origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                        None
                    }
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build the HTTP router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.gateway.max_upload_bytes;
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route("/generate-text", post(handlers::generate_text))
        .route("/generate-from-image", post(handlers::generate_from_image))
        .route(
            "/generate-from-document",
            post(handlers::generate_from_document),
        )
        .route("/generate-from-audio", post(handlers::generate_from_audio))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the provider named in the configuration.
    pub async fn build(
        config: GatewayConfig,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self, AppError> {
        let provider = build_provider(&config)?;
        Self::build_with_provider(config, provider, metrics).await
    }

    /// Build the application around an already constructed provider.
    pub async fn build_with_provider(
        config: GatewayConfig,
        provider: Arc<dyn TextProvider>,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self, AppError> {
        let persona = load_persona(&config).await?;

        let state = AppState {
            config: config.clone(),
            persona,
            provider,
            metrics,
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Server ready on http://localhost:{}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

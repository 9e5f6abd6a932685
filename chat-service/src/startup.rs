//! Application startup and lifecycle management.
//!
//! Builds the backends from configuration, wires the HTTP router and runs
//! the server until a shutdown signal arrives.

use crate::config::ChatConfig;
use crate::handlers::{
    app::{health_check, index, not_found},
    chat::chat,
    metrics::metrics,
};
use crate::services::providers::gemini::GeminiBackend;
use crate::services::providers::ollama::OllamaBackend;
use crate::services::providers::GenerationBackend;
use crate::services::Dispatcher;
use crate::AppState;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware, tracing::REQUEST_ID_HEADER,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Build the HTTP router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
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
        .with_state(state)
}

/// Construct both backends and the dispatcher from configuration.
pub fn build_state(config: &ChatConfig) -> Result<AppState, AppError> {
    let local: Arc<dyn GenerationBackend> = Arc::new(OllamaBackend::new(config.ollama.clone())?);
    let cloud: Arc<dyn GenerationBackend> = Arc::new(GeminiBackend::new(config.gemini.clone())?);

    tracing::info!(
        endpoint = %config.ollama.url,
        model = %config.ollama.model,
        timeout_secs = config.ollama.timeout.as_secs(),
        "Initialized Ollama backend"
    );
    tracing::info!(
        model = %config.gemini.model,
        timeout_secs = config.gemini.timeout.as_secs(),
        api_key_configured = config.gemini.api_key.is_some(),
        "Initialized Gemini backend"
    );
    if config.gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; Gemini requests and fallback will fail");
    }

    Ok(AppState::new(Dispatcher::new(local, cloud)))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: ChatConfig) -> Result<Self, AppError> {
        let state = build_state(&config)?;

        // Port 0 = random port for testing
        let address = config.common.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Chat service listening on {}:{}", config.common.host, port);

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

    /// Run the application until a shutdown signal is received.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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

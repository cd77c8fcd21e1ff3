// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::Uri,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use super::errors::{ApiError, ApiErrorResponse};
use super::generate_image::{generate_batch_handler, generate_image_handler};
use super::handlers::{health_handler, service_info_handler};
use crate::config::{Credentials, ServiceConfig};
use crate::generation::GenerationRouter;

/// Shared state of the HTTP layer
pub struct AppState {
    pub router: Arc<GenerationRouter>,
    pub credentials: Credentials,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    /// Build state with a router wired to the real providers
    pub fn new(config: ServiceConfig, credentials: Credentials) -> anyhow::Result<Self> {
        let router = GenerationRouter::new(&config, credentials.clone())?;
        Ok(Self {
            router: Arc::new(router),
            credentials,
            config: Arc::new(config),
        })
    }
}

/// Build the axum application
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(service_info_handler))
        .route("/health", get(health_handler))
        .route("/generate", post(generate_image_handler))
        .route("/generate-batch", post(generate_batch_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found_handler(uri: Uri) -> impl IntoResponse {
    ApiErrorResponse(ApiError::NotFound(format!("No route for {}", uri.path())))
}

/// Bind `addr` and serve until Ctrl-C / SIGTERM
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Image generation service listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received, draining connections");
}

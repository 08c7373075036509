//! HTTP transport for the assessment service.
//!
//! This module provides:
//! - Shared application state
//! - The axum router for submission, lookup and health endpoints
//! - A listener loop with graceful shutdown on Ctrl-C

mod handlers;

pub use handlers::*;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tracing::info;

use crate::analysis::AnalysisProvider;
use crate::assessment::AssessmentService;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::storage::Storage;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Submission and lookup pipeline.
    pub service: AssessmentService,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        provider: Arc<dyn AnalysisProvider>,
    ) -> Self {
        let service = AssessmentService::new(storage, provider, &config.assessment);
        info!(
            policy = ?service.policy(),
            analysis_deadline_ms = config.assessment.analysis_deadline_ms,
            "AppState initialized"
        );
        Self { config, service }
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;

/// Build the HTTP router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/assessment", post(submit_assessment))
        .route("/api/assessment/:user_id", get(latest_assessment))
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(state: SharedState) -> AppResult<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Failed to bind {}: {}", addr, e),
        })?;

    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Server error: {}", e),
        })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

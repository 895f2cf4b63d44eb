// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! HTTP control surface

pub mod handlers;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::config::ServerConfig;
use crate::core::ExamEngine;

fn routes() -> Router<Arc<ExamEngine>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/exam/start", post(handlers::start_exam))
        .route("/exam/stop", post(handlers::stop_exam))
        .route("/exam/status", get(handlers::exam_status))
        .route("/exam/snapshot", get(handlers::snapshot))
        .route("/exam/incidents", get(handlers::recent_incidents))
        .route("/config", get(handlers::get_config).post(handlers::update_config))
}

/// Control routes at the root and again under `/api`
pub fn router(engine: Arc<ExamEngine>, request_timeout: Duration) -> Router {
    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

/// Serve until Ctrl-C, then stop any active session
pub async fn serve(engine: Arc<ExamEngine>, config: &ServerConfig) -> Result<()> {
    let addr = config.bind_addr();
    let app = router(engine.clone(), Duration::from_secs(config.request_timeout_secs));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Control API listening on http://{}", addr);
    info!("  POST /exam/start | /exam/stop");
    info!("  GET  /exam/status | /exam/snapshot | /exam/incidents");
    info!("  GET  /config | POST /config | GET /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped, shutting down engine");
    engine.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

//! Main HTTP server.
//!
//! One route carries the pipeline; health and the static landing page
//! are plumbing around it.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use snaptask_pipeline::Orchestrator;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use crate::process;

/// Screenshots from phone cameras run large; 20 MiB keeps headroom over
/// axum's 2 MiB default.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application state shared across routes.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the router: pipeline endpoint, health check, static page.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/process-screenshot", post(process::process_screenshot))
        .route("/health", get(health))
        .route_service("/", ServeFile::new("static/index.html"))
        .nest_service("/static", ServeDir::new("static"))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Bind and serve until the process is stopped.
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = build_router(state);
    info!("snaptask HTTP server listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

//! HTTP API: manual trigger, status, and health
//!
//! - `POST /api/v1/sync`: run a pass now; 409 while one is running
//! - `GET /api/v1/status`: status record of the last pass
//! - `GET|HEAD /healthz`: 200 when healthy, 503 otherwise

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use guardsync_core::{Error, SyncEngine};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the API router around a shared engine
pub fn router(engine: Arc<SyncEngine>) -> Router {
    Router::new()
        .route("/api/v1/sync", post(trigger_sync))
        .route("/api/v1/status", get(status))
        // GET routes answer HEAD as well
        .route("/healthz", get(healthz))
        .with_state(engine)
}

async fn trigger_sync(State(engine): State<Arc<SyncEngine>>) -> Response {
    info!("Sync triggered via API");
    match engine.run_sync().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(Error::SyncInProgress) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "sync already running" })),
        )
            .into_response(),
        Err(e) => {
            warn!("Triggered sync failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn status(State(engine): State<Arc<SyncEngine>>) -> Response {
    Json(engine.status().await).into_response()
}

async fn healthz(State(engine): State<Arc<SyncEngine>>) -> StatusCode {
    if engine.is_healthy().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

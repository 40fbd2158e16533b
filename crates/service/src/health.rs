use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use agora_core::{LivenessReport, ReadyState};

use crate::context::ServiceContext;

/// Build the health surface every service exposes.
///
/// - `GET /health`: full report with per-dependency checks, always `200`.
/// - `GET /health/live`: process liveness, always `200` while serving.
/// - `GET /health/ready`: `200` when every dependency answers, `503` with
///   the first failing dependency named otherwise.
pub fn health_router(context: Arc<ServiceContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/live", get(live))
        .route("/health/ready", get(ready))
        .with_state(context)
}

async fn health(State(context): State<Arc<ServiceContext>>) -> impl IntoResponse {
    let report = context.health().await;
    (StatusCode::OK, Json(report))
}

async fn live() -> impl IntoResponse {
    (StatusCode::OK, Json(LivenessReport::ok()))
}

async fn ready(State(context): State<Arc<ServiceContext>>) -> impl IntoResponse {
    let report = context.readiness().await;
    let code = match report.status {
        ReadyState::Ok => StatusCode::OK,
        ReadyState::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(report))
}

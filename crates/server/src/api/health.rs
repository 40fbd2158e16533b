use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use agora_core::{HealthReport, LivenessReport, ReadyState};
use agora_gateway::MetricsSnapshot;

use super::AppState;

/// Body of the gateway's own `GET /health`: the standard service report
/// plus the gateway counters.
#[derive(Debug, Serialize)]
pub struct GatewayHealthResponse {
    #[serde(flatten)]
    pub report: HealthReport,
    pub metrics: MetricsSnapshot,
}

/// `GET /health` handler.
pub async fn health(State(state): State<AppState>) -> Json<GatewayHealthResponse> {
    Json(GatewayHealthResponse {
        report: state.context.health().await,
        metrics: state.metrics.snapshot(),
    })
}

/// `GET /health/live` handler.
pub async fn live() -> Json<LivenessReport> {
    Json(LivenessReport::ok())
}

/// `GET /health/ready` handler.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.context.readiness().await;
    let code = match report.status {
        ReadyState::Ok => StatusCode::OK,
        ReadyState::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(report))
}

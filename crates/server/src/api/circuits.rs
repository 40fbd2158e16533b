use axum::Json;
use axum::extract::{Path, State};
use tracing::info;

use agora_core::{CircuitActionResponse, ListCircuitsResponse};

use super::AppState;
use crate::error::ServerError;

/// `GET /api/health/circuits` handler: snapshot of every circuit breaker.
pub async fn list_circuits(State(state): State<AppState>) -> Json<ListCircuitsResponse> {
    Json(ListCircuitsResponse {
        circuits: state.breakers.snapshots(),
    })
}

/// `POST /api/health/circuits/{name}/trip` handler: force a circuit open.
pub async fn trip_circuit(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CircuitActionResponse>, ServerError> {
    let Some(breaker) = state.breakers.get(&name) else {
        return Err(ServerError::UnknownService(name));
    };
    breaker.trip();
    info!(service = %name, "circuit breaker manually tripped");
    Ok(Json(CircuitActionResponse {
        name,
        state: "open".to_string(),
        message: "circuit breaker tripped".to_string(),
    }))
}

/// `POST /api/health/circuits/{name}/reset` handler: force a circuit closed.
pub async fn reset_circuit(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CircuitActionResponse>, ServerError> {
    let Some(breaker) = state.breakers.get(&name) else {
        return Err(ServerError::UnknownService(name));
    };
    breaker.reset();
    info!(service = %name, "circuit breaker manually reset");
    Ok(Json(CircuitActionResponse {
        name,
        state: "closed".to_string(),
        message: "circuit breaker reset".to_string(),
    }))
}

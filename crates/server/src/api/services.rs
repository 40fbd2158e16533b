use axum::Json;
use axum::extract::State;

use agora_core::ListServicesResponse;

use super::AppState;

/// `GET /api/health/services` handler: last observed status of every
/// watched service.
pub async fn list_services(State(state): State<AppState>) -> Json<ListServicesResponse> {
    Json(ListServicesResponse {
        services: state.registry.statuses(),
    })
}

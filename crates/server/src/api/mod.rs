pub mod circuits;
pub mod health;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use agora_gateway::{CircuitBreakerRegistry, GatewayMetrics, ServiceRegistry};
use agora_service::ServiceContext;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registry of watched backend services.
    pub registry: Arc<ServiceRegistry>,
    /// Circuit breakers, one per watched service.
    pub breakers: Arc<CircuitBreakerRegistry>,
    /// Gateway counters.
    pub metrics: Arc<GatewayMetrics>,
    /// The daemon's own health context.
    pub context: Arc<ServiceContext>,
}

/// Build the Axum router with all API routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        // The gateway's own health surface
        .route("/health", get(health::health))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        // Aggregate health of watched services
        .route("/api/health/services", get(services::list_services))
        // Circuit breaker state and admin controls
        .route("/api/health/circuits", get(circuits::list_circuits))
        .route(
            "/api/health/circuits/{name}/trip",
            post(circuits::trip_circuit),
        )
        .route(
            "/api/health/circuits/{name}/reset",
            post(circuits::reset_circuit),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that can occur when running the Agora gateway daemon.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file did not parse.
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A gateway-level error surfaced through the API.
    #[error("gateway error: {0}")]
    Gateway(#[from] agora_gateway::GatewayError),

    /// The named service is not registered with the gateway.
    #[error("unknown service: {0}")]
    UnknownService(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::UnknownService(name) => (
                StatusCode::NOT_FOUND,
                format!("unknown service: {name}"),
            ),
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::Toml(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::Gateway(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

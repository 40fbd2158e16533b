use thiserror::Error;

/// Errors surfaced by the event bus.
///
/// Callers that publish through [`emit`](crate::EventBusClient::emit) never
/// see these; emission is best-effort and failures are logged and dropped at
/// that boundary. `send` and `subscribe` propagate them normally.
#[derive(Debug, Error)]
pub enum BusError {
    /// Failed to reach or authenticate with the broker.
    #[error("broker connection error: {0}")]
    Connection(String),

    /// The broker accepted the connection but the publish failed.
    #[error("publish failed: {0}")]
    Publish(String),

    /// Channel subscription could not be established.
    #[error("subscribe failed: {0}")]
    Subscribe(String),

    /// A payload could not be serialized into an envelope.
    #[error("event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// `send` got no reply within the configured timeout.
    #[error("no reply for `{pattern}` within {timeout_ms}ms")]
    RequestTimeout { pattern: String, timeout_ms: u64 },
}

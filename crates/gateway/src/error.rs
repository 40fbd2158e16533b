use thiserror::Error;

/// Errors that can occur in gateway components.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Building or using the probe HTTP client failed.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A gateway component was misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

use thiserror::Error;

/// Errors that can occur while bootstrapping or running a service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Reading a config file or serving traffic failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file did not parse.
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The backing store could not be reached during startup.
    #[error("store error: {0}")]
    Store(#[from] agora_store::StoreError),
}

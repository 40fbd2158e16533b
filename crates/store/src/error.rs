use thiserror::Error;

/// Errors from the store connector.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A connection attempt failed for a reason retrying cannot fix
    /// (unparseable URL, bad options).
    #[error("store connection failed: {0}")]
    Connection(String),

    /// Every configured attempt failed. Fatal at startup: a service with no
    /// storage cannot serve traffic.
    #[error("store connection failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The pool was requested before `connect()` succeeded, or after the
    /// connector shut down.
    #[error("store is not connected")]
    NotConnected,
}

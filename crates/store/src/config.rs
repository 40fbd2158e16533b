use std::time::Duration;

use serde::Deserialize;

/// Configuration for a service's private data store, usually the `[store]`
/// section of its config file. Every field has a default so an empty section
/// (or none at all) yields a runnable local setup.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Postgres connection URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Maximum connections in the sqlx pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Connection attempts before startup is declared failed.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base: after attempt N fails, the connector sleeps
    /// `initial_delay_ms * 2^(N-1)` before attempt N+1.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Per-attempt budget for establishing the first pool connection.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Budget for the `SELECT 1` health round-trip. Kept well under a second
    /// so readiness probes answer inside the gateway's poll timeout.
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
}

fn default_url() -> String {
    String::from("postgres://localhost:5432/agora")
}

fn default_pool_size() -> u32 {
    5
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_connect_timeout_ms() -> u64 {
    3_000
}

fn default_health_timeout_ms() -> u64 {
    800
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            pool_size: default_pool_size(),
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            health_timeout_ms: default_health_timeout_ms(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}

use std::time::Duration;

use serde::Deserialize;

/// Environment variable carrying the broker connection string. Leaving it
/// unset is a supported configuration: the bus runs in no-op mode.
pub const BROKER_URL_ENV: &str = "AGORA_BROKER_URL";

/// Event bus configuration, usually the `[bus]` section of a service's
/// config file.
#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    /// Broker connection string (`redis://host:port`). `None` switches the
    /// client permanently into no-op mode for the life of the process.
    #[serde(default)]
    pub broker_url: Option<String>,

    /// Namespace prefix for broker channels.
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,

    /// How long `send` waits for a reply before giving up.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Per-attempt broker connection timeout.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_channel_prefix() -> String {
    "agora:".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_connect_timeout_ms() -> u64 {
    2_000
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            broker_url: None,
            channel_prefix: default_channel_prefix(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl BusConfig {
    /// Configuration from the process environment: broker address from
    /// [`BROKER_URL_ENV`], everything else defaulted.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            broker_url: std::env::var(BROKER_URL_ENV).ok().and_then(normalize_address),
            ..Self::default()
        }
    }

    /// Set the broker address explicitly (tests, embedded setups).
    #[must_use]
    pub fn with_broker_url(mut self, url: impl Into<String>) -> Self {
        self.broker_url = normalize_address(url.into());
        self
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Treat empty and whitespace-only addresses the same as unset ones.
fn normalize_address(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BusConfig::default();
        assert!(config.broker_url.is_none());
        assert_eq!(config.channel_prefix, "agora:");
        assert_eq!(config.request_timeout(), Duration::from_millis(5_000));
        assert_eq!(config.connect_timeout(), Duration::from_millis(2_000));
    }

    #[test]
    fn empty_config_section_deserializes() {
        let config: BusConfig = toml_like_empty();
        assert!(config.broker_url.is_none());
        assert_eq!(config.request_timeout_ms, 5_000);
    }

    fn toml_like_empty() -> BusConfig {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }

    #[test]
    fn blank_addresses_are_treated_as_unset() {
        assert!(normalize_address(String::new()).is_none());
        assert!(normalize_address("   ".to_string()).is_none());
        assert_eq!(
            normalize_address("  redis://broker:6379 ".to_string()).as_deref(),
            Some("redis://broker:6379")
        );
    }

    #[test]
    fn with_broker_url_normalizes() {
        let config = BusConfig::default().with_broker_url("  ");
        assert!(config.broker_url.is_none());
        let config = BusConfig::default().with_broker_url("redis://localhost:6379");
        assert_eq!(config.broker_url.as_deref(), Some("redis://localhost:6379"));
    }
}

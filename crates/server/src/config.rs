use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use agora_core::ServiceDescriptor;
use agora_gateway::{CircuitBreakerConfig, HealthPollerConfig};

/// Top-level configuration for the gateway daemon, loaded from a TOML file.
///
/// # Example
///
/// ```toml
/// [server]
/// host = "0.0.0.0"
/// port = 8080
///
/// [registry]
/// poll_interval_ms = 10000
/// probe_timeout_ms = 2000
///
/// [circuit_breaker]
/// failure_threshold = 5
/// success_threshold = 2
/// open_duration_ms = 30000
///
/// [circuit_breaker.services.payment]
/// failure_threshold = 3
/// open_duration_ms = 10000
///
/// [[services]]
/// name = "auth"
/// base_address = "http://localhost:3001"
///
/// [[services]]
/// name = "payment"
/// base_address = "http://localhost:3002"
/// health_check_path = "/health/ready"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgoraConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Health poller configuration.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Circuit breaker defaults and per-service overrides.
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerServerConfig,
    /// Backend services the gateway watches.
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

/// HTTP server bind configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name the daemon reports on its own health surface.
    #[serde(default = "default_name")]
    pub name: String,
    /// Bind host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_name() -> String {
    "gateway".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Health poller configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Milliseconds between poll cycles.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per-probe timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl RegistryConfig {
    /// Poller settings in the gateway crate's terms.
    pub fn poller(&self) -> HealthPollerConfig {
        HealthPollerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
        }
    }
}

/// Circuit breaker defaults and per-service overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerServerConfig {
    /// Default number of consecutive failures before opening a circuit.
    #[serde(default = "default_cb_failure_threshold")]
    pub failure_threshold: u32,
    /// Default number of consecutive half-open successes to close a circuit.
    #[serde(default = "default_cb_success_threshold")]
    pub success_threshold: u32,
    /// Default cooldown in milliseconds before probing an open circuit.
    #[serde(default = "default_cb_open_duration_ms")]
    pub open_duration_ms: u64,
    /// Timeout applied to guarded outbound calls, in milliseconds.
    #[serde(default = "default_cb_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Per-service configuration overrides.
    #[serde(default)]
    pub services: HashMap<String, CircuitBreakerServiceConfig>,
}

fn default_cb_failure_threshold() -> u32 {
    5
}

fn default_cb_success_threshold() -> u32 {
    2
}

fn default_cb_open_duration_ms() -> u64 {
    30_000
}

fn default_cb_call_timeout_ms() -> u64 {
    5_000
}

impl Default for CircuitBreakerServerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_cb_failure_threshold(),
            success_threshold: default_cb_success_threshold(),
            open_duration_ms: default_cb_open_duration_ms(),
            call_timeout_ms: default_cb_call_timeout_ms(),
            services: HashMap::new(),
        }
    }
}

impl CircuitBreakerServerConfig {
    /// Effective breaker settings for a service, applying any override.
    pub fn for_service(&self, name: &str) -> CircuitBreakerConfig {
        let override_cfg = self.services.get(name);
        CircuitBreakerConfig {
            failure_threshold: override_cfg
                .and_then(|o| o.failure_threshold)
                .unwrap_or(self.failure_threshold),
            success_threshold: override_cfg
                .and_then(|o| o.success_threshold)
                .unwrap_or(self.success_threshold),
            open_duration: Duration::from_millis(
                override_cfg
                    .and_then(|o| o.open_duration_ms)
                    .unwrap_or(self.open_duration_ms),
            ),
        }
    }

    /// Timeout for guarded outbound calls.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Per-service circuit breaker overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerServiceConfig {
    /// Number of consecutive failures before opening the circuit.
    pub failure_threshold: Option<u32>,
    /// Number of consecutive half-open successes to close the circuit.
    pub success_threshold: Option<u32>,
    /// Cooldown in milliseconds before probing an open circuit.
    pub open_duration_ms: Option<u64>,
}

/// One watched backend service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEntry {
    /// Service name, also the circuit breaker key.
    pub name: String,
    /// Base address, e.g. `http://localhost:3001`.
    pub base_address: String,
    /// Readiness path polled by the registry.
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
}

fn default_health_check_path() -> String {
    "/health/ready".to_string()
}

impl ServiceEntry {
    /// The registry descriptor for this entry.
    pub fn descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor::new(&self.name, &self.base_address)
            .with_health_check_path(&self.health_check_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_yields_defaults() {
        let config: AgoraConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.name, "gateway");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.registry.poll_interval_ms, 10_000);
        assert_eq!(config.registry.probe_timeout_ms, 2_000);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.success_threshold, 2);
        assert_eq!(config.circuit_breaker.open_duration_ms, 30_000);
        assert!(config.services.is_empty());
    }

    #[test]
    fn parses_services_and_overrides() {
        let raw = r#"
            [server]
            port = 9090

            [registry]
            poll_interval_ms = 5000

            [circuit_breaker]
            failure_threshold = 4

            [circuit_breaker.services.payment]
            failure_threshold = 2
            open_duration_ms = 10000

            [[services]]
            name = "auth"
            base_address = "http://localhost:3001"

            [[services]]
            name = "payment"
            base_address = "http://localhost:3002"
            health_check_path = "/health"
        "#;
        let config: AgoraConfig = toml::from_str(raw).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.registry.poll_interval_ms, 5000);
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[0].health_check_path, "/health/ready");
        assert_eq!(config.services[1].health_check_path, "/health");

        // Override applies only to the named service.
        let payment = config.circuit_breaker.for_service("payment");
        assert_eq!(payment.failure_threshold, 2);
        assert_eq!(payment.success_threshold, 2);
        assert_eq!(payment.open_duration, Duration::from_secs(10));

        let auth = config.circuit_breaker.for_service("auth");
        assert_eq!(auth.failure_threshold, 4);
        assert_eq!(auth.open_duration, Duration::from_secs(30));
    }

    #[test]
    fn descriptor_carries_health_path() {
        let entry = ServiceEntry {
            name: "seller".into(),
            base_address: "http://localhost:3003".into(),
            health_check_path: "/health/ready".into(),
        };
        let descriptor = entry.descriptor();
        assert_eq!(descriptor.name, "seller");
        assert_eq!(
            descriptor.health_url(),
            "http://localhost:3003/health/ready"
        );
    }
}

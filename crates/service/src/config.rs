use std::path::Path;

use serde::Deserialize;
use tracing::info;

use agora_bus::BusConfig;
use agora_store::StoreConfig;

use crate::error::ServiceError;

/// Top-level configuration for one backend service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name reported by the health surface.
    #[serde(default = "default_name")]
    pub name: String,
    /// Listen host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Backing store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Event bus settings.
    #[serde(default)]
    pub bus: BusConfig,
}

fn default_name() -> String {
    "agora-service".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            host: default_host(),
            port: default_port(),
            store: StoreConfig::default(),
            bus: BusConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, ServiceError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Address the service binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

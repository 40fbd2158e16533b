use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last observed health classification for a backend service.
///
/// `Unknown` until the first poll completes. The gateway's poller then writes
/// `Healthy` (readiness answered 200), `Degraded` (answered non-200) or
/// `Unreachable` (timeout or connection error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Unknown,
    Healthy,
    Degraded,
    Unreachable,
}

impl ServiceStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unreachable => "unreachable",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one backend service, from gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// Short service name (`auth`, `payment`, ...). Registry key.
    pub name: String,

    /// Scheme + authority the service listens on, e.g. `http://payment:4003`.
    pub base_address: String,

    /// Probe path the gateway polls, joined onto `base_address`.
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
}

fn default_health_check_path() -> String {
    "/health/ready".to_string()
}

impl ServiceDescriptor {
    /// Descriptor with the default readiness probe path.
    #[must_use]
    pub fn new(name: impl Into<String>, base_address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_address: base_address.into(),
            health_check_path: default_health_check_path(),
        }
    }

    /// Override the probe path.
    #[must_use]
    pub fn with_health_check_path(mut self, path: impl Into<String>) -> Self {
        self.health_check_path = path.into();
        self
    }

    /// Full probe URL, tolerant of stray slashes on either side.
    #[must_use]
    pub fn health_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_address.trim_end_matches('/'),
            self.health_check_path.trim_start_matches('/')
        )
    }
}

/// One row of `GET /api/health/services`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub name: String,
    pub status: ServiceStatus,
    /// Wall-clock time of the most recent completed poll, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<DateTime<Utc>>,
}

/// Body of `GET /api/health/services`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListServicesResponse {
    pub services: Vec<ServiceHealth>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ServiceStatus::Unreachable).unwrap(),
            "unreachable"
        );
        assert_eq!(ServiceStatus::Unknown.to_string(), "unknown");
    }

    #[test]
    fn health_url_joins_without_double_slash() {
        let d = ServiceDescriptor::new("payment", "http://payment:4003/");
        assert_eq!(d.health_url(), "http://payment:4003/health/ready");

        let custom = ServiceDescriptor::new("auth", "http://auth:4001")
            .with_health_check_path("status/ready");
        assert_eq!(custom.health_url(), "http://auth:4001/status/ready");
    }

    #[test]
    fn descriptor_defaults_probe_path_when_deserialized() {
        let d: ServiceDescriptor = serde_json::from_value(serde_json::json!({
            "name": "seller",
            "baseAddress": "http://seller:4004"
        }))
        .unwrap();
        assert_eq!(d.health_check_path, "/health/ready");
    }

    #[test]
    fn service_health_row_uses_camel_case() {
        let row = ServiceHealth {
            name: "content".into(),
            status: ServiceStatus::Healthy,
            last_checked_at: Some(Utc::now()),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json.get("lastCheckedAt").is_some());
    }
}

use std::time::Duration;

use agora_core::{ListCircuitsResponse, ListServicesResponse};

/// Thin HTTP client for the gateway's aggregate health surface.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a client for the given endpoint, e.g. `http://localhost:8080`.
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Join a path onto the gateway endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET /api/health/services`.
    pub async fn services(&self) -> anyhow::Result<ListServicesResponse> {
        let response = self
            .http
            .get(self.url("/api/health/services"))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// `GET /api/health/circuits`.
    pub async fn circuits(&self) -> anyhow::Result<ListCircuitsResponse> {
        let response = self
            .http
            .get(self.url("/api/health/circuits"))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

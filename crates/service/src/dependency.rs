use async_trait::async_trait;

use agora_store::StoreConnector;

/// A dependency whose availability gates service readiness.
///
/// Implementations must answer without panicking; probes that can hang
/// are expected to bound themselves with a timeout.
#[async_trait]
pub trait Dependency: Send + Sync {
    /// Short name used as the key in health reports.
    fn name(&self) -> &str;

    /// Whether the dependency currently answers.
    async fn is_available(&self) -> bool;
}

#[async_trait]
impl Dependency for StoreConnector {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn is_available(&self) -> bool {
        self.is_healthy().await
    }
}

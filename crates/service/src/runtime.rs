use std::sync::Arc;

use axum::Router;
use tracing::info;

use agora_bus::{BROKER_URL_ENV, EventBusClient};
use agora_store::StoreConnector;

use crate::config::ServiceConfig;
use crate::context::ServiceContext;
use crate::dependency::Dependency;
use crate::error::ServiceError;

/// Handles produced by [`bootstrap`], shared by the service's routes,
/// subscribers, and shutdown path.
pub struct Service {
    /// Health-surface state; the store is pre-registered as a dependency.
    pub context: Arc<ServiceContext>,
    /// Connected store handle.
    pub store: Arc<StoreConnector>,
    /// Event bus client, possibly in no-op mode.
    pub bus: EventBusClient,
}

/// Connect the store and bus for a service and assemble its context.
///
/// Store connection failures are fatal: a service whose store never comes
/// up within the retry budget must not start. The bus never blocks startup;
/// without a broker address it degrades to no-op mode.
pub async fn bootstrap(config: &ServiceConfig) -> Result<Service, ServiceError> {
    let store = Arc::new(StoreConnector::new(config.store.clone()));
    store.connect().await?;

    // The environment wins over the config file for the broker address.
    let mut bus_config = config.bus.clone();
    if let Ok(url) = std::env::var(BROKER_URL_ENV) {
        bus_config = bus_config.with_broker_url(url);
    }
    let bus = EventBusClient::connect(bus_config).await;

    let context = Arc::new(
        ServiceContext::new(config.name.clone())
            .with_dependency(Arc::clone(&store) as Arc<dyn Dependency>),
    );

    Ok(Service {
        context,
        store,
        bus,
    })
}

/// Serve the app until SIGINT or SIGTERM.
pub async fn serve(app: Router, addr: &str) -> Result<(), ServiceError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "service listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}

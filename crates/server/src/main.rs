use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use agora_gateway::{CircuitBreakerRegistry, GatewayMetrics, HealthPoller, ServiceRegistry};
use agora_server::api::AppState;
use agora_server::config::AgoraConfig;
use agora_service::ServiceContext;

/// Agora gateway HTTP server.
#[derive(Parser, Debug)]
#[command(
    name = "agora-server",
    about = "Health-watching gateway for Agora marketplace services"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "agora.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config: AgoraConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        toml::from_str("")?
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if !Path::new(&cli.config).exists() {
        info!(
            path = %cli.config,
            "config file not found, using defaults"
        );
    }

    // One registry entry and one circuit breaker per configured service.
    let mut registry = ServiceRegistry::new();
    let mut breakers = CircuitBreakerRegistry::new();
    for entry in &config.services {
        let breaker_config = config.circuit_breaker.for_service(&entry.name);
        breaker_config
            .validate()
            .map_err(|e| format!("circuit breaker config for {}: {e}", entry.name))?;
        registry.register(entry.descriptor());
        breakers.register(&entry.name, breaker_config);
    }
    let registry = Arc::new(registry);
    let breakers = Arc::new(breakers);
    info!(
        services = registry.len(),
        breaker_overrides = config.circuit_breaker.services.len(),
        "service registry initialized"
    );

    let metrics = Arc::new(GatewayMetrics::default());

    // Background readiness poller, stopped through the shutdown channel.
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let poller = HealthPoller::new(
        Arc::clone(&registry),
        Arc::clone(&metrics),
        &config.registry.poller(),
        shutdown_rx,
    )?;
    let poller_handle = tokio::spawn(poller.run());

    let context = Arc::new(ServiceContext::new(&config.server.name));
    let state = AppState {
        registry,
        breakers,
        metrics,
        context,
    };
    let app = agora_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "agora-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(agora_service::shutdown_signal())
        .await?;

    // Stop the poller before exit.
    let _ = shutdown_tx.send(()).await;
    let _ = poller_handle.await;

    info!("agora-server shut down");
    Ok(())
}

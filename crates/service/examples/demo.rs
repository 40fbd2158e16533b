//! Minimal marketplace service: store, bus, and the health surface.
//!
//! Run with: `cargo run -p agora-service --example demo`
//!
//! Expects a local Postgres (see the `[store]` defaults). Without
//! `AGORA_BROKER_URL` set the bus runs in no-op mode and the service
//! still starts; point it at a Redis broker to see events flow.

use agora_bus::EventDispatcher;
use agora_core::catalog::{OrderConfirmed, patterns};
use agora_service::{ServiceConfig, bootstrap, health_router, serve};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_toml_str(
        r#"
        name = "payment"
        port = 3002
        "#,
    )?;

    let service = bootstrap(&config).await?;

    // React to confirmed orders from anywhere in the marketplace.
    let dispatcher = EventDispatcher::new().on::<OrderConfirmed, _, _>(|order| async move {
        println!(
            "  [payment] order {} confirmed: {} {}",
            order.order_id, order.amount_cents, order.currency
        );
        Ok(())
    });
    let subscription = service.bus.subscribe(&[patterns::ORDER_CONFIRMED]).await?;
    tokio::spawn(async move { dispatcher.run(subscription).await });

    let app = health_router(service.context.clone());
    serve(app, &config.bind_address()).await?;

    service.store.disconnect().await;
    Ok(())
}

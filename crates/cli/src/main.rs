//! Agora CLI
//!
//! A command-line interface for inspecting the Agora health gateway.

mod client;
mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use crate::client::GatewayClient;

/// Inspect the Agora health gateway from the command line.
#[derive(Parser, Debug)]
#[command(name = "agora", version, about)]
struct Cli {
    /// Gateway endpoint URL.
    #[arg(
        long,
        env = "AGORA_ENDPOINT",
        default_value = "http://localhost:8080",
        global = true
    )]
    endpoint: String,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the last observed status of every watched service.
    Services,
    /// Show circuit breaker states.
    Circuits,
    /// Fire a batch of requests at the gateway health surface and report
    /// the outcome.
    Smoke(commands::smoke::SmokeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = GatewayClient::new(&cli.endpoint)?;

    match cli.command {
        Command::Services => commands::services::run(&client, &cli.format).await,
        Command::Circuits => commands::circuits::run(&client, &cli.format).await,
        Command::Smoke(args) => commands::smoke::run(&client, &args, &cli.format).await,
    }
}

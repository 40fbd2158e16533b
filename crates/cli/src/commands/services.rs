use agora_core::ServiceStatus;

use crate::OutputFormat;
use crate::client::GatewayClient;

pub async fn run(client: &GatewayClient, format: &OutputFormat) -> anyhow::Result<()> {
    let resp = client.services().await?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        OutputFormat::Text => {
            println!("{} services:", resp.services.len());
            for s in &resp.services {
                let mark = match s.status {
                    ServiceStatus::Healthy => "OK ",
                    ServiceStatus::Degraded => "DEG",
                    ServiceStatus::Unreachable => "ERR",
                    ServiceStatus::Unknown => " ? ",
                };
                let checked = s
                    .last_checked_at
                    .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
                println!(
                    "  [{mark}] {name:<12} | {status:<11} | last checked: {checked}",
                    name = s.name,
                    status = s.status,
                );
            }
        }
    }

    let unreachable = resp
        .services
        .iter()
        .filter(|s| s.status == ServiceStatus::Unreachable)
        .count();
    if unreachable > 0 {
        eprintln!("{unreachable} service(s) unreachable");
        std::process::exit(1);
    }
    Ok(())
}

use crate::OutputFormat;
use crate::client::GatewayClient;

pub async fn run(client: &GatewayClient, format: &OutputFormat) -> anyhow::Result<()> {
    let resp = client.circuits().await?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        OutputFormat::Text => {
            println!("{} circuits:", resp.circuits.len());
            for c in &resp.circuits {
                let mark = match c.state.as_str() {
                    "closed" => "OK ",
                    "half_open" => "TRY",
                    _ => "ERR",
                };
                let opened = c
                    .opened_at
                    .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
                println!(
                    "  [{mark}] {name:<12} | {state:<9} | failures: {failures} | opened: {opened}",
                    name = c.name,
                    state = c.state,
                    failures = c.consecutive_failures,
                );
            }
        }
    }

    let open = resp.circuits.iter().filter(|c| c.state == "open").count();
    if open > 0 {
        eprintln!("{open} circuit(s) open");
        std::process::exit(1);
    }
    Ok(())
}

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use clap::Args;
use serde::Serialize;

use crate::OutputFormat;
use crate::client::GatewayClient;

/// Paths the harness exercises, round-robin per worker.
const SMOKE_PATHS: [&str; 3] = ["/health", "/api/health/services", "/api/health/circuits"];

/// Minimum success rate for a passing run, in percent.
const PASS_RATE: f64 = 95.0;

#[derive(Args, Debug)]
pub struct SmokeArgs {
    /// Total number of requests to issue.
    #[arg(long, default_value_t = 100)]
    pub requests: u32,

    /// Number of concurrent workers.
    #[arg(long, default_value_t = 8)]
    pub concurrency: u32,
}

/// Outcome counts accumulated by one worker.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    successes: u32,
    /// Non-2xx, non-5xx responses (redirects, client errors).
    other_failures: u32,
    /// 5xx responses.
    server_errors: u32,
    /// Timeouts and connection errors.
    unreachable: u32,
}

impl Tally {
    fn merge(&mut self, other: Tally) {
        self.successes += other.successes;
        self.other_failures += other.other_failures;
        self.server_errors += other.server_errors;
        self.unreachable += other.unreachable;
    }

    fn total(self) -> u32 {
        self.successes + self.other_failures + self.server_errors + self.unreachable
    }
}

/// Final verdict for one smoke run.
#[derive(Debug, Serialize)]
pub struct SmokeReport {
    requests: u32,
    successes: u32,
    other_failures: u32,
    server_errors: u32,
    unreachable: u32,
    success_rate: f64,
    passed: bool,
}

impl From<Tally> for SmokeReport {
    fn from(tally: Tally) -> Self {
        let requests = tally.total();
        let success_rate = if requests == 0 {
            100.0
        } else {
            f64::from(tally.successes) * 100.0 / f64::from(requests)
        };
        // A single 5xx or unreachable response fails the run regardless of
        // the overall rate.
        let passed =
            success_rate >= PASS_RATE && tally.server_errors == 0 && tally.unreachable == 0;
        Self {
            requests,
            successes: tally.successes,
            other_failures: tally.other_failures,
            server_errors: tally.server_errors,
            unreachable: tally.unreachable,
            success_rate,
            passed,
        }
    }
}

pub async fn run(
    client: &GatewayClient,
    args: &SmokeArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let concurrency = args.concurrency.max(1);
    let requests = args.requests;
    let counter = Arc::new(AtomicU32::new(0));
    let urls: Vec<String> = SMOKE_PATHS.iter().map(|p| client.url(p)).collect();

    let mut workers = tokio::task::JoinSet::new();
    for _ in 0..concurrency {
        let http = client.http().clone();
        let counter = Arc::clone(&counter);
        let urls = urls.clone();
        workers.spawn(async move {
            let mut tally = Tally::default();
            let mut next = 0;
            loop {
                if counter.fetch_add(1, Ordering::Relaxed) >= requests {
                    break;
                }
                let url = &urls[next];
                next = (next + 1) % urls.len();
                match http.get(url).send().await {
                    Ok(response) if response.status().is_success() => tally.successes += 1,
                    Ok(response) if response.status().is_server_error() => {
                        tally.server_errors += 1;
                    }
                    Ok(_) => tally.other_failures += 1,
                    Err(_) => tally.unreachable += 1,
                }
            }
            tally
        });
    }

    let mut total = Tally::default();
    while let Some(tally) = workers.join_next().await {
        total.merge(tally?);
    }

    let report = SmokeReport::from(total);
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!(
                "{} requests | {} ok | {} other | {} 5xx | {} unreachable | success rate {:.1}%",
                report.requests,
                report.successes,
                report.other_failures,
                report.server_errors,
                report.unreachable,
                report.success_rate,
            );
            println!("{}", if report.passed { "PASS" } else { "FAIL" });
        }
    }

    if !report.passed {
        std::process::exit(1);
    }
    Ok(())
}

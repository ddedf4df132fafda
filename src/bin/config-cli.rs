use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand};

use dynamic_config::matching::Resource;
use dynamic_config::protocol::{ConfigClient, ConfigRequest, ConfigResponse};

#[derive(Parser)]
#[command(name = "config-cli")]
#[command(about = "Polling client for the dynamic config service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:55700")]
    url: String,

    /// Resource attribute as key=value (repeatable)
    #[arg(short, long = "resource", value_parser = parse_attribute)]
    resource: Vec<(String, String)>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll once and print the response
    Get {
        /// Last known fingerprint (base64)
        #[arg(short, long)]
        fingerprint: Option<String>,
    },
    /// Poll on the suggested interval, printing each new configuration
    Watch {
        /// Stop after this many polls
        #[arg(long)]
        max_polls: Option<u64>,
    },
}

const RETRY_DELAY: Duration = Duration::from_secs(5);

fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got {:?}", raw)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _ = dynamic_config::observability::logging::init("info");

    let client = ConfigClient::new(&cli.url, Duration::from_secs(cli.timeout_secs))?;
    let resource = cli
        .resource
        .iter()
        .fold(Resource::new(), |resource, (key, value)| {
            resource.with_attribute(key.as_str(), value.as_str())
        });

    match cli.command {
        Commands::Get { fingerprint } => {
            let last_known = match fingerprint {
                Some(encoded) => STANDARD.decode(encoded.trim())?,
                None => Vec::new(),
            };
            let response = client
                .get_config(&ConfigRequest::new(resource, last_known))
                .await?;
            print_response(&response)?;
        }
        Commands::Watch { max_polls } => {
            tokio::select! {
                result = watch(&client, resource, max_polls) => result?,
                _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
            }
        }
    }

    Ok(())
}

async fn watch(
    client: &ConfigClient,
    resource: Resource,
    max_polls: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut request = ConfigRequest::new(resource, Vec::new());
    let mut polls = 0u64;

    loop {
        let delay = match client.get_config(&request).await {
            Ok(response) => {
                if response.is_full() {
                    print_response(&response)?;
                    request.last_known_fingerprint = response.fingerprint.clone();
                } else {
                    tracing::debug!("Configuration unchanged");
                }
                Duration::from_secs(response.suggested_wait_time_seconds.max(1) as u64)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Poll failed, keeping last configuration");
                RETRY_DELAY
            }
        };

        polls += 1;
        if max_polls.is_some_and(|max| polls >= max) {
            return Ok(());
        }
        tokio::time::sleep(delay).await;
    }
}

fn print_response(response: &ConfigResponse) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

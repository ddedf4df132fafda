//! Dynamic configuration distribution service.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │               DYNAMIC CONFIG SERVICE             │
//!                          │                                                  │
//!     Client poll          │  ┌─────────┐    ┌───────────────┐                │
//!     ─────────────────────┼─▶│  http   │───▶│    service    │                │
//!     (resource, last fp)  │  │ server  │    │ hit / miss    │                │
//!                          │  └─────────┘    └───────┬───────┘                │
//!                          │                         │                        │
//!                          │                         ▼                        │
//!                          │                 ┌───────────────┐                │
//!                          │                 │    backend    │                │
//!                          │                 │ file | remote │────────────────┼──▶ Upstream
//!                          │                 └───────┬───────┘                │    authority
//!                          │                         │                        │
//!                          │            ┌────────────┴───────────┐            │
//!                          │            ▼                        ▼            │
//!                          │     ┌────────────┐           ┌────────────┐      │
//!                          │     │  matching  │           │   model    │      │
//!                          │     │ resource → │           │ schedules, │      │
//!                          │     │   blocks   │           │fingerprint │      │
//!                          │     └────────────┘           └────────────┘      │
//!                          │                                                  │
//!                          │  Cross-cutting: config, lifecycle, observability │
//!                          └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use dynamic_config::config::{read_config, validate_config, ConfigError, ServiceConfig};
use dynamic_config::lifecycle::{wait_for_signal, Shutdown};
use dynamic_config::observability::{logging, metrics};
use dynamic_config::{HttpServer, ServiceBuilder};

#[derive(Parser)]
#[command(name = "dynamic-config")]
#[command(about = "Serves metric collection schedules to polling telemetry clients", long_about = None)]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Schedule file to serve (overrides settings)
    #[arg(long)]
    local_config_file: Option<PathBuf>,

    /// Upstream config service to proxy (overrides settings)
    #[arg(long, conflicts_with = "local_config_file")]
    remote_endpoint: Option<String>,

    /// Listener bind address (overrides settings)
    #[arg(long)]
    bind: Option<String>,
}

impl Args {
    fn settings(&self) -> Result<ServiceConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(path) = &self.local_config_file {
            config.source.local_config_file = Some(path.clone());
            config.source.remote_endpoint = None;
        }
        if let Some(endpoint) = &self.remote_endpoint {
            config.source.remote_endpoint = Some(endpoint.clone());
            config.source.local_config_file = None;
        }
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = args.settings()?;

    logging::init(&config.observability.log_level)?;
    tracing::info!("dynamic-config v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let service = Arc::new(ServiceBuilder::from_config(&config).build()?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server = HttpServer::new(service, &config);
    let server_shutdown = shutdown.subscribe();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                tracing::info!(signal, "Shutdown signal received");
                signal_shutdown.trigger();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signals"),
        }
    });

    // Closes the service on every exit path, including a serve error.
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

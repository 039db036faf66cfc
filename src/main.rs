//! controller-dispatch demo service.
//!
//! ```text
//!   Client ──▶ axum (trace, timeout, body limit, request id)
//!                │
//!                ▼
//!          path template ──▶ Dispatcher<ItemsController>
//!                               lookup → admit → decode → bind
//!                               → invoke → encode → write
//!                │                          │
//!                ◀──────── oneshot sink ◀───┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use controller_dispatch::config::{load_config, ServiceConfig};
use controller_dispatch::items::ItemsController;
use controller_dispatch::lifecycle::{wait_for_signal, Shutdown};
use controller_dispatch::observability::{logging, metrics};
use controller_dispatch::{ControllerConfig, Dispatcher, HttpServer};

#[derive(Debug, Parser)]
#[command(name = "controller-dispatch", version, about = "Serve controllers over HTTP")]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "controller-dispatch starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        accepted = ?config.controller.accepted_content_types,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let controller_config = ControllerConfig::from_settings(&config.controller)?;
    let items = Arc::new(Dispatcher::new(ItemsController::new(controller_config)));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)
        .mount("/items", Arc::clone(&items))
        .mount("/items/{id}", items);

    let shutdown = Shutdown::new();
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}

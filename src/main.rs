//! Operator CLI for the Scrapoxy fleet.
//!
//! ```text
//!   scrapoxy-pipeline --config pipeline.toml status
//!   scrapoxy-pipeline --config pipeline.toml proxies
//!   scrapoxy-pipeline --config pipeline.toml mode HOT
//!   scrapoxy-pipeline --config pipeline.toml remove <PROXY_ID> [--no-force]
//!   scrapoxy-pipeline --config pipeline.toml watch
//! ```
//!
//! `watch` runs the admission gate's refresh loop on its own, which is useful
//! for checking the restart-mode behaviour against a live fleet.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use scrapoxy_pipeline::config::load_config;
use scrapoxy_pipeline::lifecycle::signals::shutdown_on_ctrl_c;
use scrapoxy_pipeline::observability::{logging, metrics};
use scrapoxy_pipeline::pool::{PoolControl, ProjectMode, ProxyToRemove, ScrapoxyClient};
use scrapoxy_pipeline::Fleet;

#[derive(Parser)]
#[command(name = "scrapoxy-pipeline")]
#[command(about = "Inspect and steer a Scrapoxy project", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "pipeline.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the project and its current mode
    Status,
    /// List connectors and their proxies
    Proxies,
    /// Request a project mode (HOT, WARM, COLD, OFF)
    Mode { mode: ProjectMode },
    /// Ask the fleet to remove a proxy
    Remove {
        id: String,
        /// Let in-flight requests finish on the proxy
        #[arg(long)]
        no_force: bool,
    },
    /// Keep the pool snapshot fresh and log it until Ctrl+C
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_logging(&config.observability)?;
    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    tracing::info!(
        api = %config.api.url,
        config = %cli.config.display(),
        "scrapoxy-pipeline v0.1.0 starting"
    );

    let client = Arc::new(ScrapoxyClient::new(&config.api)?);

    match cli.command {
        Commands::Status => print_json(&client.get_project().await?)?,
        Commands::Proxies => print_json(&client.get_all_connectors_and_proxies().await?)?,
        Commands::Mode { mode } => {
            client.set_project_status(mode).await?;
            println!("Project mode set to {}", mode);
        }
        Commands::Remove { id, no_force } => {
            client
                .ask_proxies_to_remove(&[ProxyToRemove {
                    id: id.clone(),
                    force: !no_force,
                }])
                .await?;
            println!("Removal of proxy {} requested", id);
        }
        Commands::Watch => {
            let fleet = Fleet::from_config(&config, client)?;
            watch(&fleet).await;
        }
    }

    Ok(())
}

async fn watch(fleet: &Fleet) {
    let shutdown = fleet.shutdown().clone();
    tokio::spawn(shutdown_on_ctrl_c(shutdown.clone()));

    let mut shutdown_rx = shutdown.subscribe();
    let mut ticker = tokio::time::interval(fleet.gate().config().refresh_interval());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match fleet.gate().refresh_if_stale().await {
                    Ok(true) => {
                        if let Some(snapshot) = fleet.cache().load() {
                            tracing::info!(
                                connectors_active = snapshot.connectors_active,
                                proxies_usable = snapshot.proxies_usable,
                                "Pool"
                            );
                        }
                    }
                    Ok(false) => {}
                    Err(e) => tracing::error!(error = %e, "Refresh failed"),
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }

    tracing::info!("Shutdown complete");
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Outreach server - REST API for the sales-outreach contact pipeline.

use anyhow::Result;
use clap::Parser;
use outreach_server::{config, logging, routes, state};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use logging::{LogArgs, LogConfig};
use state::AppState;

/// Outreach server - contact pipeline and lead-collection API.
#[derive(Parser, Debug)]
#[command(name = "outreach-server")]
#[command(about = "REST API for the sales-outreach contact pipeline")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Override database path from config
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from(&cli.log);
    logging::init(&log_config);

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env();

    // Apply CLI overrides
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let credentials = config.credentials();
    tracing::info!(
        target: "outreach::startup",
        port = config.port,
        db = %config.db_path.display(),
        browser_automation = credentials.browser_automation,
        search_api = credentials.search_api,
        enrichment_api = credentials.enrichment_api,
        "Loaded configuration"
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app = routes::app(Arc::new(AppState::new(config)?));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(target: "outreach::startup", "Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(target: "outreach::startup", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(target: "outreach::startup", "Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

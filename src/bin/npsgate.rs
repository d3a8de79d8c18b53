//! NPS gateway binary.
//!
//! Starts the loopback backend application and one TCP listener per
//! configured port, then runs until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use npsgate::{EchoHandler, GatewayConfig, GatewayServer, VERSION};

#[derive(Parser)]
#[command(name = "npsgate")]
#[command(version = VERSION)]
#[command(about = "Multi-port TCP gateway for the legacy game suite", long_about = None)]
struct Cli {
    /// Host to bind listeners to
    #[arg(long)]
    host: Option<String>,

    /// Comma-separated TCP ports to listen on
    #[arg(short, long)]
    ports: Option<String>,

    /// Loopback port for the backend HTTP application
    #[arg(short, long)]
    backend_port: Option<u16>,

    /// TOML config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Config file, then environment, then CLI flags
    let mut config = match &cli.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::from_env(),
    };
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(ports) = cli.ports {
        let parsed: Vec<u16> = ports
            .split(',')
            .filter_map(|p| p.trim().parse().ok())
            .collect();
        if !parsed.is_empty() {
            config.ports = parsed;
        }
    }
    if let Some(port) = cli.backend_port {
        config.backend_port = port;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let backend_port = config.backend_port;
        tokio::spawn(async move {
            if let Err(e) = npsgate::backend::serve(backend_port).await {
                tracing::error!(port = backend_port, error = %e, "backend application exited");
            }
        });

        let gateway = GatewayServer::new(config, Arc::new(EchoHandler));
        let bound = gateway.start().await?;
        tracing::info!(?bound, "gateway started");

        tokio::signal::ctrl_c().await?;
        tracing::info!("shutting down");
        Ok(())
    })
}

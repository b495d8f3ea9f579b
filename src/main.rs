//! NUT Exporter Binary Entry Point
//!
//! Serves Prometheus metrics for the UPS devices behind one or more NUT
//! servers. Core functionality is provided by the `nut_exporter` library.

use clap::Parser;
use nut_exporter::{
    NutCollector,
    config::{AppConfig, parse_hosts, parse_timeout},
    server::{AppState, create_router},
};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// NUT Exporter - Prometheus metrics for Network UPS Tools
#[derive(Parser, Debug)]
#[command(name = "nut-exporter", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, env = "NUT_EXPORTER_CONFIG")]
    config: Option<String>,

    /// Space-separated NUT servers to poll, e.g. "localhost ups.lan:3493"
    #[arg(long, env = "NUT_EXPORTER_HOSTS")]
    hosts: Option<String>,

    /// Server bind address (overrides config file)
    #[arg(long, env = "NUT_EXPORTER_SERVER_BIND")]
    server_bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "NUT_EXPORTER_SERVER_PORT")]
    server_port: Option<u16>,

    /// Read/write deadline per NUT operation, e.g. "10s" (overrides config file)
    #[arg(long, env = "NUT_EXPORTER_TIMEOUT", value_parser = parse_timeout)]
    timeout: Option<Duration>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,nut_exporter=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("NUT Exporter - Prometheus metrics for Network UPS Tools");

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            AppConfig::load(path)?
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            AppConfig::default()
        }
    };

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(hosts) = cli.hosts {
        config.set_targets(parse_hosts(&hosts)?);
    }
    if let Some(bind) = cli.server_bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.server_port {
        config.server.port = port;
    }
    if let Some(timeout) = cli.timeout {
        config.nut.io_timeout = timeout;
    }
    config.validate()?;

    let targets: Vec<&str> = config.nut.targets.iter().map(|t| t.as_str()).collect();
    tracing::info!(
        "Server: {}:{}, NUT targets: {} (io timeout {:?}, concurrency {})",
        config.server.bind,
        config.server.port,
        targets.join(" "),
        config.nut.io_timeout,
        config.nut.concurrency,
    );

    // Build collector and Axum router
    let collector = NutCollector::new(config.nut.clone());
    let app = create_router(AppState::new(collector));

    // Parse bind address
    let addr = SocketAddr::new(config.server.bind.parse::<IpAddr>()?, config.server.port);

    tracing::info!("Metrics available at: http://{}/metrics", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}

//! Icecast Exporter CLI
//!
//! Serves `/metrics` for Prometheus, or prints a single scrape with `--once`.

use clap::Parser;
use icecast_exporter::{
    metrics::{MetricsServer, MetricsServerConfig},
    Collector, ExporterConfig,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};

/// Prometheus exporter for Icecast mountpoint statistics.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address from the configuration.
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Collect once, print the exposition text to stdout and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ExporterConfig::from_file(path),
        None => {
            let config = ExporterConfig::default();
            config.validate().map(|()| config)
        }
    };
    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }

    info!("Icecast exporter v{}", icecast_exporter::VERSION);
    info!(
        upstream = %config.upstream.base_url,
        mountpoints = ?config.upstream.mountpoints,
        credentials = ?config.credentials,
        "Configuration loaded"
    );

    let collector = match Collector::new(&config) {
        Ok(collector) => collector,
        Err(e) => {
            eprintln!("Failed to set up upstream client: {}", e);
            std::process::exit(1);
        }
    };

    if args.once {
        match collector.render().await {
            Ok(body) => print!("{}", body),
            Err(e) => {
                error!(error = %e, "Collection failed");
                std::process::exit(1);
            }
        }
        return;
    }

    let server = MetricsServer::new(
        MetricsServerConfig {
            bind_addr: config.server.listen,
        },
        collector,
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Shutdown requested");
    };

    if let Err(e) = server.run(shutdown).await {
        error!(error = %e, "Metrics server failed");
        std::process::exit(1);
    }
}

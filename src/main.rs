use anyhow::Result;
use clap::Parser;
use smtpd_exporter::{
    config::{parse_duration, Config},
    server,
};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Time to wait between two smtpctl calls, e.g. "1s" or "500ms" (overrides config)
    #[arg(long, visible_alias = "exec-time", alias = "execTime", value_parser = parse_duration)]
    interval: Option<Duration>,

    /// Port to listen on for metrics (overrides config)
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Host to listen on (overrides config)
    #[arg(long, env = "EXPORTER_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting smtpd Prometheus Exporter v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Override with CLI arguments if provided
    if let Some(interval) = args.interval {
        config.poll.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    info!("Configuration loaded successfully");
    info!(
        "Running '{} {}' every {:?}",
        config.sampler.command,
        config.sampler.args.join(" "),
        config.interval()
    );

    // Start the metrics server
    if let Err(e) = server::start(config).await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

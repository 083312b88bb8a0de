use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use bank_server::config::{load_config, validate_config, BankConfig, ConfigError};
use bank_server::lifecycle::signals;
use bank_server::observability::{logging, metrics};
use bank_server::{BankServer, Listener, Shutdown};

#[derive(Parser)]
#[command(name = "bank-server")]
#[command(about = "Multi-client bank account server", long_about = None)]
struct Args {
    /// Port to listen on; overrides the port of `listener.bind_address`.
    port: Option<u16>,

    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

fn build_config(args: &Args) -> Result<BankConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => BankConfig::default(),
    };

    if let Some(level) = &args.log_level {
        config.observability.log_level = level.clone();
    }
    if let Some(port) = args.port {
        // An unparsable bind_address is reported by validation below.
        let _ = config.listener.override_port(port);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = build_config(&args)?;

    logging::init_logging(&config.observability);

    tracing::info!("bank-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        idle_timeout_secs = config.session.idle_timeout_secs,
        snapshot_interval_secs = config.snapshot.interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_handler(Arc::clone(&shutdown));

    let server = BankServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! pathcheckd: periodic multipath path health checker.
//!
//! # Architecture Overview
//!
//! ```text
//!   config (TOML) ──▶ PathMonitor ──tick──▶ Checker (one per path)
//!                                              │
//!                                 ┌────────────┴────────────┐
//!                                 ▼                         ▼
//!                           sync: probe inline     async: TurChecker
//!                                 │                   worker thread
//!                                 ▼                         │
//!                            SG_IO ioctl ◀──────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use path_checker::config::{load_config, MonitorConfig};
use path_checker::lifecycle::{signals, Shutdown};
use path_checker::observability::{logging, metrics};
use path_checker::PathMonitor;

#[derive(Parser)]
#[command(name = "pathcheckd")]
#[command(about = "Monitors the health of multipath I/O paths", long_about = None)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Check every path once, synchronously, print a JSON report and exit.
    #[arg(long)]
    once: bool,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    logging::init(&config.observability)?;

    tracing::info!(
        paths = config.paths.len(),
        checker = %config.checker.name,
        timeout_secs = config.checker.timeout_secs,
        "pathcheckd v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if cli.once {
        config.checker.async_mode = false;
        let mut monitor = PathMonitor::from_config(&config)?;
        let reports = monitor.check_all();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let monitor = PathMonitor::from_config(&config)?;
    let shutdown = Shutdown::new();
    let monitor_task = tokio::spawn(monitor.run(shutdown.subscribe()));

    signals::wait_for_shutdown_signal(shutdown).await?;
    monitor_task.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

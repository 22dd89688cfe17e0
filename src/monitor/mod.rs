//! Path monitoring (the polling caller).
//!
//! # Responsibilities
//! - Own one checker and one open descriptor per configured path
//! - Poll every path on a fixed interval
//! - Log state transitions and record metrics
//!
//! # Data Flow
//! ```text
//! Tokio interval tick
//!     → check_all (blocking section, bounded by the poll budget per async path)
//!     → PathReport per path
//!     → transition log + metrics
//! ```

mod path;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time;

use crate::checker::{lookup, Checker, CheckerError, PathState};
use crate::config::MonitorConfig;
use crate::observability::metrics;
use crate::scsi::{ScsiTransport, SgIoTransport};

pub use path::MonitoredPath;

/// Result of checking one path, as printed by `pathcheckd --once`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathReport {
    pub name: String,
    pub device: String,
    pub checker: &'static str,
    pub state: PathState,
    pub code: i32,
    pub message: &'static str,
}

/// Polls a fixed set of paths.
#[derive(Debug)]
pub struct PathMonitor {
    paths: Vec<MonitoredPath>,
    interval: Duration,
}

impl PathMonitor {
    /// Build a monitor probing real devices through `SG_IO`.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, CheckerError> {
        Self::with_transport(config, Arc::new(SgIoTransport::new()))
    }

    /// Build a monitor whose checkers share `transport`.
    pub fn with_transport(
        config: &MonitorConfig,
        transport: Arc<dyn ScsiTransport>,
    ) -> Result<Self, CheckerError> {
        let defaults = &config.checker;
        let mut paths = Vec::with_capacity(config.paths.len());

        for path in &config.paths {
            let name = path.checker.as_deref().unwrap_or(&defaults.name);
            let mut checker = Checker::new(lookup(name)?, Arc::clone(&transport))
                .with_device(path.device.clone())
                .with_settings(defaults.settings());
            checker.set_timeout(defaults.timeout());
            if defaults.async_mode {
                checker.set_async();
            } else {
                checker.set_sync();
            }
            checker.init()?;

            paths.push(MonitoredPath::open(path.name.clone(), checker));
        }

        tracing::info!(
            paths = paths.len(),
            checker = %defaults.name,
            async_mode = defaults.async_mode,
            "Path monitor configured"
        );

        Ok(Self {
            paths,
            interval: defaults.interval(),
        })
    }

    pub fn paths(&self) -> &[MonitoredPath] {
        &self.paths
    }

    /// Poll every path once.
    pub fn check_all(&mut self) -> Vec<PathReport> {
        self.paths
            .iter_mut()
            .map(|path| {
                let report = path.check();
                if report.state != PathState::Pending {
                    metrics::record_check_result(&report.name, report.state);
                }
                report
            })
            .collect()
    }

    /// Poll on the configured interval until shutdown is signalled.
    ///
    /// Requires a multi-threaded runtime: synchronous checkers block.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Path monitor starting");
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::task::block_in_place(|| self.check_all());
                }
                _ = shutdown.recv() => {
                    tracing::info!("Path monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

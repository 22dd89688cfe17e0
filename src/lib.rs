//! Multipath path health checking.
//!
//! One `Checker` per I/O path probes the device with a SCSI command and
//! classifies the reply into a `PathState`. The `tur` checker can run its
//! probe on a worker thread so that polling many paths never stalls on a
//! single unresponsive device.

pub mod checker;
pub mod config;
pub mod engine;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod probe;
pub mod scsi;

pub use checker::{Checker, CheckerError, CheckerKind, CheckerSettings, MsgId, PathState};
pub use config::MonitorConfig;
pub use monitor::PathMonitor;

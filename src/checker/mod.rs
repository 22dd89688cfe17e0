//! Path checker abstraction.
//!
//! # Data Flow
//! ```text
//! caller registers a path
//!     → registry::lookup(name) → CheckerKind
//!     → Checker::new + init (strategy state allocated)
//!
//! every poll:
//!     Checker::check
//!     → disabled?        → Unchecked
//!     → fd <= 0?         → Unsupported ("no usable fd"), no I/O
//!     → Strategy::check  → PathState + MsgId
//!
//! path removed:
//!     Checker::free / drop (never blocks)
//! ```
//!
//! # Design Decisions
//! - The fd is borrowed: the caller opens and closes the device
//! - Strategies are a closed, registered set behind one trait
//! - `check` takes `&mut self`, so one handle is never checked concurrently

pub mod registry;
pub mod state;

use std::os::fd::RawFd;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::scsi::{ScsiTransport, SgIoTransport};

pub use registry::{lookup, CheckerKind};
pub use state::{MsgId, PathState};

/// Default probe timeout when the caller sets none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while resolving or initializing a checker.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckerError {
    /// No strategy registered under this name.
    #[error("checker '{0}' not found")]
    NotFound(String),

    #[error("invalid checker settings: {0}")]
    InvalidSettings(&'static str),
}

/// Tunables shared by all strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckerSettings {
    /// Total attempts for transient conditions before reporting `Down`.
    pub retries: u32,
    /// Longest a polling call waits for an async worker to finish.
    pub poll_budget: Duration,
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            retries: 5,
            poll_budget: Duration::from_millis(1),
        }
    }
}

impl CheckerSettings {
    pub fn validate(&self) -> Result<(), CheckerError> {
        if self.retries == 0 {
            return Err(CheckerError::InvalidSettings("retries must be at least 1"));
        }
        if self.poll_budget.is_zero() {
            return Err(CheckerError::InvalidSettings("poll budget must be non-zero"));
        }
        Ok(())
    }
}

/// Per-call view of the handle given to a strategy.
#[derive(Debug, Clone, Copy)]
pub struct CheckTarget<'a> {
    pub fd: RawFd,
    pub timeout: Duration,
    pub sync: bool,
    pub device: &'a str,
}

/// Strategy-private state created by `init` and released on `free`.
pub trait Strategy: Send + std::fmt::Debug {
    /// Probe the path. May block only when the strategy runs synchronously.
    fn check(&mut self, target: &CheckTarget<'_>) -> (PathState, MsgId);
}

/// Inputs a strategy receives when it is initialized.
#[derive(Debug, Clone)]
pub struct StrategyParams {
    pub device: String,
    pub transport: Arc<dyn ScsiTransport>,
    pub settings: CheckerSettings,
}

/// One checker per path, owned by the caller.
#[derive(Debug)]
pub struct Checker {
    kind: CheckerKind,
    device: String,
    fd: RawFd,
    timeout: Duration,
    sync: bool,
    disabled: bool,
    msgid: MsgId,
    settings: CheckerSettings,
    transport: Arc<dyn ScsiTransport>,
    strategy: Option<Box<dyn Strategy>>,
}

impl Checker {
    /// Create an uninitialized checker that probes through `transport`.
    pub fn new(kind: CheckerKind, transport: Arc<dyn ScsiTransport>) -> Self {
        Self {
            kind,
            device: String::new(),
            fd: -1,
            timeout: DEFAULT_TIMEOUT,
            sync: false,
            disabled: false,
            msgid: MsgId::None,
            settings: CheckerSettings::default(),
            transport,
            strategy: None,
        }
    }

    /// Resolve `name` and create a checker on the `SG_IO` transport.
    pub fn from_name(name: &str) -> Result<Self, CheckerError> {
        let kind = lookup(name)?;
        Ok(Self::new(kind, Arc::new(SgIoTransport::new())))
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    pub fn with_settings(mut self, settings: CheckerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Allocate strategy state. Any previous state is freed first.
    pub fn init(&mut self) -> Result<(), CheckerError> {
        self.free();
        self.settings.validate()?;
        let params = StrategyParams {
            device: self.device.clone(),
            transport: Arc::clone(&self.transport),
            settings: self.settings,
        };
        self.strategy = Some(self.kind.init(params)?);
        self.msgid = MsgId::None;
        Ok(())
    }

    /// Check the path once.
    pub fn check(&mut self) -> PathState {
        if self.disabled {
            self.msgid = MsgId::Disabled;
            return PathState::Unchecked;
        }
        if self.fd <= 0 {
            self.msgid = MsgId::NoFd;
            return PathState::Unsupported;
        }
        let Some(strategy) = self.strategy.as_mut() else {
            self.msgid = MsgId::Uninitialized;
            return PathState::Unsupported;
        };

        let target = CheckTarget {
            fd: self.fd,
            timeout: self.timeout,
            sync: self.sync || !self.kind.supports_async(),
            device: &self.device,
        };
        let (state, msgid) = strategy.check(&target);
        self.msgid = msgid;
        state
    }

    /// Release strategy state without waiting on outstanding probes.
    pub fn free(&mut self) {
        self.strategy = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.strategy.is_some()
    }

    pub fn kind(&self) -> CheckerKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    pub fn set_fd(&mut self, fd: RawFd) {
        self.fd = fd;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn is_sync(&self) -> bool {
        self.sync
    }

    pub fn set_sync(&mut self) {
        self.sync = true;
    }

    pub fn set_async(&mut self) {
        self.sync = false;
    }

    pub fn enable(&mut self) {
        self.disabled = false;
    }

    pub fn disable(&mut self) {
        self.disabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    pub fn msgid(&self) -> MsgId {
        self.msgid
    }

    /// Text of the last message.
    pub fn message(&self) -> &'static str {
        self.msgid.text()
    }

    /// Message prefixed with the checker name, for logs.
    pub fn describe(&self) -> String {
        format!("{} checker: {}", self.name(), self.message())
    }
}

//! A monitored path: device descriptor, checker and last reported state.

use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;

use crate::checker::{Checker, PathState};
use crate::monitor::PathReport;

#[derive(Debug)]
pub struct MonitoredPath {
    name: String,
    // Declared before `file` so the checker is freed before the fd closes.
    checker: Checker,
    file: Option<File>,
    last: PathState,
}

impl MonitoredPath {
    /// Open the checker's device read-only and non-blocking.
    ///
    /// An open failure leaves the path without a descriptor; its checks then
    /// report `Unsupported`.
    pub fn open(name: String, mut checker: Checker) -> Self {
        let file = match OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(checker.device())
        {
            Ok(file) => {
                checker.set_fd(file.as_raw_fd());
                Some(file)
            }
            Err(e) => {
                tracing::warn!(path = %name, device = checker.device(), error = %e, "Failed to open path device");
                checker.set_fd(-1);
                None
            }
        };
        Self {
            name,
            checker,
            file,
            last: PathState::Unchecked,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn last_state(&self) -> PathState {
        self.last
    }

    pub fn checker(&self) -> &Checker {
        &self.checker
    }

    /// Check once and record a transition when the state settles on a new value.
    pub fn check(&mut self) -> PathReport {
        let state = self.checker.check();

        if state != PathState::Pending && state != self.last {
            let degraded = matches!(state, PathState::Down | PathState::Timeout);
            if degraded {
                tracing::warn!(
                    path = %self.name,
                    from = %self.last,
                    to = %state,
                    message = self.checker.message(),
                    "Path state changed"
                );
            } else {
                tracing::info!(
                    path = %self.name,
                    from = %self.last,
                    to = %state,
                    message = self.checker.message(),
                    "Path state changed"
                );
            }
            self.last = state;
        }

        PathReport {
            name: self.name.clone(),
            device: self.checker.device().to_string(),
            checker: self.checker.name(),
            state,
            code: state.code(),
            message: self.checker.message(),
        }
    }
}

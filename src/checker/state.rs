//! Path states and checker message identifiers.
//!
//! # States
//! ```text
//! Unsupported (-1)  no usable fd, or the probe does not apply to the device
//! Unchecked    (0)  nothing has been checked yet, or the checker is disabled
//! Down / Up / Shaky / Ghost   results of a completed probe
//! Pending / Timeout           produced only by an asynchronous checker
//! ```
//!
//! # Design Decisions
//! - Integer codes are a stable contract with the caller
//! - States are tags, not a scale: no ordering is derived

use serde::Serialize;

/// Health of a single I/O path as reported by a checker.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathState {
    /// Probe not applicable to this device ("wild").
    Unsupported = -1,
    Unchecked = 0,
    Down = 1,
    Up = 2,
    Shaky = 3,
    /// Reachable but not able to service I/O (standby controller port).
    Ghost = 4,
    /// Asynchronous probe started, result not available yet.
    Pending = 5,
    /// Asynchronous probe exceeded its deadline.
    Timeout = 6,
}

impl PathState {
    /// Stable integer code.
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PathState::Unsupported => "unsupported",
            PathState::Unchecked => "unchecked",
            PathState::Down => "down",
            PathState::Up => "up",
            PathState::Shaky => "shaky",
            PathState::Ghost => "ghost",
            PathState::Pending => "pending",
            PathState::Timeout => "timeout",
        }
    }

    /// True for the states only an asynchronous checker may produce.
    pub fn is_async_only(self) -> bool {
        matches!(self, PathState::Pending | PathState::Timeout)
    }
}

impl TryFrom<i32> for PathState {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(PathState::Unsupported),
            0 => Ok(PathState::Unchecked),
            1 => Ok(PathState::Down),
            2 => Ok(PathState::Up),
            3 => Ok(PathState::Shaky),
            4 => Ok(PathState::Ghost),
            5 => Ok(PathState::Pending),
            6 => Ok(PathState::Timeout),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for PathState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable reason attached to the last check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgId {
    #[default]
    None,
    Disabled,
    NoFd,
    Uninitialized,
    Unsupported,
    Up,
    Down,
    Ghost,
    /// Async probe still in flight.
    Running,
    /// Async probe passed its deadline.
    Timeout,
}

impl MsgId {
    /// Human-readable message text.
    pub fn text(self) -> &'static str {
        match self {
            MsgId::None => "",
            MsgId::Disabled => "checker disabled",
            MsgId::NoFd => "no usable fd",
            MsgId::Uninitialized => "checker not initialized",
            MsgId::Unsupported => "probe not supported by device",
            MsgId::Up => "path is up",
            MsgId::Down => "path is down",
            MsgId::Ghost => "path is ghost",
            MsgId::Running => "checker still running",
            MsgId::Timeout => "checker timed out",
        }
    }
}

impl std::fmt::Display for MsgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

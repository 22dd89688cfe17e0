//! TEST UNIT READY probe.
//!
//! # Classification (first match wins)
//! ```text
//! ioctl fails with ENOTTY                 → Unsupported (never retried)
//! ioctl fails otherwise                   → Down
//! kernel reports no status to examine     → Up
//! status & 0x7e == 0x18                   → Up   (reservation conflict)
//! host status is a driver-level glitch    → retry
//! sense key Unit Attention                → retry
//! sense key Not Ready, ASC/ASCQ 04/0b     → Ghost
//! anything else                           → Down
//! ```
//! Retries are bounded by the attempt limit; an exhausted retry is `Down`.

use std::io;
use std::os::fd::RawFd;
use std::sync::Arc;
use std::time::Duration;

use crate::checker::state::{MsgId, PathState};
use crate::scsi::sense::key;
use crate::scsi::{host, ScsiCommand, ScsiReply, ScsiTransport, STATUS_RESERVATION_CONFLICT};

/// Outcome of a single probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Done(PathState, MsgId),
    Retry(RetryReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// Host status signalled a driver glitch rather than a device failure.
    HostStatus(u16),
    UnitAttention,
}

impl std::fmt::Display for RetryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryReason::HostStatus(status) => write!(f, "host status {:#04x}", status),
            RetryReason::UnitAttention => f.write_str("unit attention"),
        }
    }
}

/// Host statuses that report a real transport outcome and are not retried.
fn host_status_is_final(status: u16) -> bool {
    matches!(
        status,
        host::DID_OK
            | host::DID_NO_CONNECT
            | host::DID_BAD_TARGET
            | host::DID_ABORT
            | host::DID_TRANSPORT_FAILFAST
    )
}

/// Classify one TEST UNIT READY completion.
pub fn classify(result: &io::Result<ScsiReply>) -> Verdict {
    let reply = match result {
        Ok(reply) => reply,
        Err(e) if e.raw_os_error() == Some(libc::ENOTTY) => {
            return Verdict::Done(PathState::Unsupported, MsgId::Unsupported);
        }
        Err(_) => return Verdict::Done(PathState::Down, MsgId::Down),
    };

    if reply.is_clean() {
        return Verdict::Done(PathState::Up, MsgId::Up);
    }
    if reply.status & 0x7e == STATUS_RESERVATION_CONFLICT {
        return Verdict::Done(PathState::Up, MsgId::Up);
    }
    if !host_status_is_final(reply.host_status) {
        return Verdict::Retry(RetryReason::HostStatus(reply.host_status));
    }

    match reply.sense_data() {
        Some(sense) if sense.key == key::UNIT_ATTENTION => Verdict::Retry(RetryReason::UnitAttention),
        Some(sense) if sense.is_standby() => Verdict::Done(PathState::Ghost, MsgId::Ghost),
        _ => Verdict::Done(PathState::Down, MsgId::Down),
    }
}

/// Blocking TEST UNIT READY with bounded retries.
#[derive(Debug, Clone)]
pub struct TurProbe {
    transport: Arc<dyn ScsiTransport>,
    max_attempts: u32,
}

impl TurProbe {
    pub fn new(transport: Arc<dyn ScsiTransport>, max_attempts: u32) -> Self {
        Self {
            transport,
            max_attempts,
        }
    }

    /// Probe `fd`, blocking the calling thread for up to `max_attempts` ioctls.
    pub fn run(&self, fd: RawFd, timeout: Duration, device: &str) -> (PathState, MsgId) {
        for attempt in 1..=self.max_attempts {
            let result = self
                .transport
                .execute(fd, &ScsiCommand::TestUnitReady, timeout);
            match classify(&result) {
                Verdict::Done(state, msgid) => {
                    tracing::trace!(device, attempt, %state, "TUR probe finished");
                    return (state, msgid);
                }
                Verdict::Retry(reason) => {
                    tracing::debug!(
                        device,
                        attempt,
                        max_attempts = self.max_attempts,
                        %reason,
                        "TUR probe retrying"
                    );
                }
            }
        }
        tracing::debug!(device, "TUR probe retries exhausted");
        (PathState::Down, MsgId::Down)
    }
}

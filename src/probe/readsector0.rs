//! READ(10) of the first logical block.
//!
//! A heavier probe than TEST UNIT READY: the device has to move data, which
//! catches paths that answer status commands but cannot serve reads.
//! Always synchronous.

use std::io;
use std::sync::Arc;

use crate::checker::state::{MsgId, PathState};
use crate::checker::{CheckTarget, Strategy};
use crate::scsi::sense::key;
use crate::scsi::{ScsiCommand, ScsiReply, ScsiTransport};

use super::tur::{RetryReason, Verdict};

const DEFAULT_BLOCK_SIZE: u32 = 512;

/// Classify one READ(10) completion.
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
    match reply.sense_data() {
        Some(sense) if sense.key == key::RECOVERED_ERROR => Verdict::Done(PathState::Up, MsgId::Up),
        Some(sense) if sense.key == key::UNIT_ATTENTION => Verdict::Retry(RetryReason::UnitAttention),
        _ => Verdict::Done(PathState::Down, MsgId::Down),
    }
}

/// Strategy state for `readsector0`.
#[derive(Debug)]
pub struct Readsector0Checker {
    transport: Arc<dyn ScsiTransport>,
    max_attempts: u32,
}

impl Readsector0Checker {
    pub fn new(transport: Arc<dyn ScsiTransport>, max_attempts: u32) -> Self {
        Self {
            transport,
            max_attempts,
        }
    }
}

impl Strategy for Readsector0Checker {
    fn check(&mut self, target: &CheckTarget<'_>) -> (PathState, MsgId) {
        let block_size = match self.transport.block_size(target.fd) {
            Ok(size) => size,
            Err(e) => {
                tracing::trace!(device = target.device, error = %e, "Block size unavailable, assuming 512");
                DEFAULT_BLOCK_SIZE
            }
        };
        let cmd = ScsiCommand::Read10 {
            lba: 0,
            blocks: 1,
            block_size,
        };

        for attempt in 1..=self.max_attempts {
            let result = self.transport.execute(target.fd, &cmd, target.timeout);
            match classify(&result) {
                Verdict::Done(state, msgid) => return (state, msgid),
                Verdict::Retry(reason) => {
                    tracing::debug!(device = target.device, attempt, %reason, "Readsector0 probe retrying");
                }
            }
        }
        (PathState::Down, MsgId::Down)
    }
}

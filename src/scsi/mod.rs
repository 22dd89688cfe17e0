//! SCSI passthrough layer.
//!
//! # Data Flow
//! ```text
//! probe (tur / readsector0)
//!     → ScsiCommand (CDB + transfer direction)
//!     → ScsiTransport::execute (sg_io.rs: SG_IO ioctl on the path fd)
//!     → ScsiReply (status bytes + raw sense)
//!     → sense.rs (sense key / ASC / ASCQ extraction)
//! ```
//!
//! # Design Decisions
//! - The transport is a trait so probes can be exercised without a device
//! - Replies carry raw bytes; interpretation belongs to the probes
//! - Ioctl failures surface as `io::Error` so callers can match on errno

pub mod sense;
pub mod sg_io;

use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

pub use sense::SenseData;
pub use sg_io::SgIoTransport;

/// SCSI status byte: CHECK CONDITION.
pub const STATUS_CHECK_CONDITION: u8 = 0x02;
/// SCSI status byte: RESERVATION CONFLICT.
pub const STATUS_RESERVATION_CONFLICT: u8 = 0x18;

/// Host (transport) status codes reported by the SCSI midlayer.
pub mod host {
    pub const DID_OK: u16 = 0x00;
    pub const DID_NO_CONNECT: u16 = 0x01;
    pub const DID_BUS_BUSY: u16 = 0x02;
    pub const DID_BAD_TARGET: u16 = 0x04;
    pub const DID_ABORT: u16 = 0x05;
    pub const DID_ERROR: u16 = 0x07;
    pub const DID_RESET: u16 = 0x08;
    pub const DID_SOFT_ERROR: u16 = 0x0b;
    pub const DID_TRANSPORT_FAILFAST: u16 = 0x0f;
}

/// Mask over `ScsiReply::info` flagging a command that did not complete cleanly.
pub const SG_INFO_OK_MASK: u32 = 0x1;
pub const SG_INFO_OK: u32 = 0x0;
pub const SG_INFO_CHECK: u32 = 0x1;

/// A command the probes know how to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScsiCommand {
    /// TEST UNIT READY, no data transfer.
    TestUnitReady,
    /// READ(10) of `blocks` logical blocks of `block_size` bytes starting at `lba`.
    Read10 { lba: u32, blocks: u16, block_size: u32 },
}

impl ScsiCommand {
    /// Command descriptor block.
    pub fn cdb(&self) -> Vec<u8> {
        match *self {
            ScsiCommand::TestUnitReady => vec![0x00; 6],
            ScsiCommand::Read10 { lba, blocks, .. } => {
                let lba = lba.to_be_bytes();
                let blocks = blocks.to_be_bytes();
                vec![
                    0x28, 0x00, lba[0], lba[1], lba[2], lba[3], 0x00, blocks[0], blocks[1], 0x00,
                ]
            }
        }
    }

    /// Number of bytes the device sends back.
    pub fn data_in_len(&self) -> usize {
        match *self {
            ScsiCommand::TestUnitReady => 0,
            ScsiCommand::Read10 {
                blocks, block_size, ..
            } => usize::from(blocks) * block_size as usize,
        }
    }
}

/// Completion of a passthrough command that reached the device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScsiReply {
    pub status: u8,
    pub host_status: u16,
    pub driver_status: u16,
    /// `SG_INFO_*` flags; the kernel sets `SG_INFO_CHECK` when any status is non-zero.
    pub info: u32,
    /// Sense bytes actually written by the device.
    pub sense: Vec<u8>,
}

impl ScsiReply {
    /// A reply with every status field clear.
    pub fn good() -> Self {
        Self::default()
    }

    /// CHECK CONDITION carrying the given raw sense bytes.
    pub fn check_condition(sense: Vec<u8>) -> Self {
        Self {
            status: STATUS_CHECK_CONDITION,
            info: SG_INFO_CHECK,
            sense,
            ..Self::default()
        }
    }

    /// A transport-level failure with no SCSI status.
    pub fn host_error(host_status: u16) -> Self {
        Self {
            host_status,
            info: SG_INFO_CHECK,
            ..Self::default()
        }
    }

    pub fn with_status(status: u8) -> Self {
        Self {
            status,
            info: SG_INFO_CHECK,
            ..Self::default()
        }
    }

    /// The kernel reported the command as completed with no status to examine.
    pub fn is_clean(&self) -> bool {
        self.info & SG_INFO_OK_MASK == SG_INFO_OK
    }

    /// Parsed sense data, if the device returned any.
    pub fn sense_data(&self) -> Option<SenseData> {
        SenseData::parse(&self.sense)
    }
}

/// Executes SCSI commands against an open path descriptor.
pub trait ScsiTransport: Send + Sync + std::fmt::Debug {
    /// Issue `cmd` on `fd`, waiting at most `timeout` inside the kernel.
    fn execute(&self, fd: RawFd, cmd: &ScsiCommand, timeout: Duration) -> io::Result<ScsiReply>;

    /// Logical block size of the device behind `fd`.
    fn block_size(&self, _fd: RawFd) -> io::Result<u32> {
        Ok(512)
    }
}

//! Linux generic SCSI (`SG_IO`) transport.
//!
//! # Responsibilities
//! - Build an `sg_io_hdr` for a command and hand it to the kernel
//! - Copy status bytes and written sense back into a `ScsiReply`
//! - Query the logical block size of block devices
//!
//! The ioctl blocks the calling thread until the device answers or the
//! kernel-side timeout fires. It is not a cancellation point.

use std::io;
use std::os::fd::RawFd;
use std::ptr;
use std::time::Duration;

use crate::scsi::{ScsiCommand, ScsiReply, ScsiTransport};

const SG_IO: u32 = 0x2285;
const BLKSSZGET: u32 = 0x1268;

const SG_DXFER_NONE: libc::c_int = -1;
const SG_DXFER_FROM_DEV: libc::c_int = -3;

const SENSE_BUFF_LEN: usize = 32;

#[repr(C)]
struct SgIoHdr {
    interface_id: libc::c_int,
    dxfer_direction: libc::c_int,
    cmd_len: libc::c_uchar,
    mx_sb_len: libc::c_uchar,
    iovec_count: libc::c_ushort,
    dxfer_len: libc::c_uint,
    dxferp: *mut libc::c_void,
    cmdp: *mut libc::c_uchar,
    sbp: *mut libc::c_uchar,
    timeout: libc::c_uint,
    flags: libc::c_uint,
    pack_id: libc::c_int,
    usr_ptr: *mut libc::c_void,
    status: libc::c_uchar,
    masked_status: libc::c_uchar,
    msg_status: libc::c_uchar,
    sb_len_wr: libc::c_uchar,
    host_status: libc::c_ushort,
    driver_status: libc::c_ushort,
    resid: libc::c_int,
    duration: libc::c_uint,
    info: libc::c_uint,
}

/// Issues commands through the `SG_IO` ioctl.
#[derive(Debug, Clone, Copy, Default)]
pub struct SgIoTransport;

impl SgIoTransport {
    pub fn new() -> Self {
        Self
    }
}

fn timeout_ms(timeout: Duration) -> libc::c_uint {
    timeout.as_millis().min(libc::c_uint::MAX as u128) as libc::c_uint
}

impl ScsiTransport for SgIoTransport {
    fn execute(&self, fd: RawFd, cmd: &ScsiCommand, timeout: Duration) -> io::Result<ScsiReply> {
        let mut cdb = cmd.cdb();
        let mut data = vec![0u8; cmd.data_in_len()];
        let mut sense = [0u8; SENSE_BUFF_LEN];

        let (direction, dxferp) = if data.is_empty() {
            (SG_DXFER_NONE, ptr::null_mut())
        } else {
            (SG_DXFER_FROM_DEV, data.as_mut_ptr().cast::<libc::c_void>())
        };

        let mut hdr = SgIoHdr {
            interface_id: libc::c_int::from(b'S'),
            dxfer_direction: direction,
            cmd_len: cdb.len() as libc::c_uchar,
            mx_sb_len: SENSE_BUFF_LEN as libc::c_uchar,
            iovec_count: 0,
            dxfer_len: data.len() as libc::c_uint,
            dxferp,
            cmdp: cdb.as_mut_ptr(),
            sbp: sense.as_mut_ptr(),
            timeout: timeout_ms(timeout),
            flags: 0,
            pack_id: 0,
            usr_ptr: ptr::null_mut(),
            status: 0,
            masked_status: 0,
            msg_status: 0,
            sb_len_wr: 0,
            host_status: 0,
            driver_status: 0,
            resid: 0,
            duration: 0,
            info: 0,
        };

        // SAFETY: every pointer in `hdr` refers to a live local buffer whose
        // length matches the corresponding length field, and all of them
        // outlive the call.
        let rc = unsafe { libc::ioctl(fd, SG_IO as _, &mut hdr as *mut SgIoHdr) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        let written = usize::from(hdr.sb_len_wr).min(SENSE_BUFF_LEN);
        Ok(ScsiReply {
            status: hdr.status,
            host_status: hdr.host_status,
            driver_status: hdr.driver_status,
            info: hdr.info,
            sense: sense[..written].to_vec(),
        })
    }

    fn block_size(&self, fd: RawFd) -> io::Result<u32> {
        let mut size: libc::c_int = 0;
        // SAFETY: BLKSSZGET writes a single int through the pointer.
        let rc = unsafe { libc::ioctl(fd, BLKSSZGET as _, &mut size as *mut libc::c_int) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        u32::try_from(size)
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid block size"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_converted_to_millis() {
        assert_eq!(timeout_ms(Duration::from_secs(30)), 30_000);
        assert_eq!(timeout_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(timeout_ms(Duration::from_secs(u64::MAX)), libc::c_uint::MAX);
    }

    #[test]
    fn ioctl_on_non_sg_fd_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain");
        std::fs::write(&path, b"not a disk").unwrap();
        let file = std::fs::File::open(&path).unwrap();
        let fd = std::os::fd::AsRawFd::as_raw_fd(&file);

        let err = SgIoTransport::new()
            .execute(fd, &ScsiCommand::TestUnitReady, Duration::from_secs(1))
            .unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENOTTY));
    }
}

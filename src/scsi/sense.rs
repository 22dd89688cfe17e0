//! Sense data decoding.
//!
//! # Formats
//! - Fixed (response code 0x70/0x71): key in byte 2, ASC/ASCQ in bytes 12/13
//! - Descriptor (response code 0x72/0x73): key in byte 1, ASC/ASCQ in bytes 2/3
//!
//! Buffers too short to hold the fields of their format decode to `None`.

/// Sense keys the probes care about.
pub mod key {
    pub const RECOVERED_ERROR: u8 = 0x1;
    pub const NOT_READY: u8 = 0x2;
    pub const MEDIUM_ERROR: u8 = 0x3;
    pub const UNIT_ATTENTION: u8 = 0x6;
}

/// ASC/ASCQ for "logical unit not accessible, target port in standby state".
pub const ASC_LU_NOT_ACCESSIBLE: u8 = 0x04;
pub const ASCQ_TARGET_PORT_STANDBY: u8 = 0x0b;

/// Decoded sense key and additional sense code/qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenseData {
    pub key: u8,
    pub asc: u8,
    pub ascq: u8,
}

impl SenseData {
    pub fn new(key: u8, asc: u8, ascq: u8) -> Self {
        Self { key, asc, ascq }
    }

    /// Decode fixed or descriptor format sense bytes.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() <= 3 {
            return None;
        }
        match buf[0] & 0x7f {
            0x72 | 0x73 => Some(Self {
                key: buf[1] & 0x0f,
                asc: buf[2],
                ascq: buf[3],
            }),
            0x70 | 0x71 if buf.len() > 13 => Some(Self {
                key: buf[2] & 0x0f,
                asc: buf[12],
                ascq: buf[13],
            }),
            _ => None,
        }
    }

    /// Encode as 18-byte fixed format sense.
    pub fn to_fixed(&self) -> Vec<u8> {
        let mut buf = vec![0u8; 18];
        buf[0] = 0x70;
        buf[2] = self.key & 0x0f;
        buf[7] = 10;
        buf[12] = self.asc;
        buf[13] = self.ascq;
        buf
    }

    /// Encode as 8-byte descriptor format sense with no descriptors.
    pub fn to_descriptor(&self) -> Vec<u8> {
        vec![0x72, self.key & 0x0f, self.asc, self.ascq, 0, 0, 0, 0]
    }

    pub fn is_standby(&self) -> bool {
        self.key == key::NOT_READY
            && self.asc == ASC_LU_NOT_ACCESSIBLE
            && self.ascq == ASCQ_TARGET_PORT_STANDBY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_format() {
        let sense = SenseData::new(key::UNIT_ATTENTION, 0x29, 0x00);
        assert_eq!(SenseData::parse(&sense.to_fixed()), Some(sense));
    }

    #[test]
    fn parses_descriptor_format() {
        let sense = SenseData::new(key::NOT_READY, 0x04, 0x0b);
        let parsed = SenseData::parse(&sense.to_descriptor()).unwrap();
        assert!(parsed.is_standby());
    }

    #[test]
    fn deferred_error_codes_are_accepted() {
        let mut buf = SenseData::new(key::MEDIUM_ERROR, 0x11, 0x00).to_fixed();
        buf[0] = 0xf1;
        assert_eq!(SenseData::parse(&buf).map(|s| s.key), Some(key::MEDIUM_ERROR));
    }

    #[test]
    fn short_or_unknown_buffers() {
        assert_eq!(SenseData::parse(&[]), None);
        assert_eq!(SenseData::parse(&[0x72, 0x02, 0x04]), None);
        // fixed format needs at least 14 bytes
        assert_eq!(SenseData::parse(&[0x70, 0, 0x06, 0, 0, 0, 0, 0]), None);
        assert_eq!(SenseData::parse(&[0x7f, 0, 0x06, 0, 0, 0]), None);
    }
}

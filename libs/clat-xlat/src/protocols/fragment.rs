//! The IPv6 Fragment extension header ([RFC 2460 Section 4.5](https://datatracker.ietf.org/doc/html/rfc2460#section-4.5))

use super::FRAGMENT_HEADER_LEN;
use crate::error::{Malformed, Result};

/// A parsed IPv6 Fragment header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentHeader {
    /// Protocol of the fragmented payload
    pub next_header: u8,
    /// Offset of this fragment in 8-byte units
    pub offset: u16,
    /// Whether more fragments follow this one
    pub more_fragments: bool,
    /// Identifies the original datagram
    pub identification: u32,
}

impl FragmentHeader {
    /// Reads a Fragment header from the front of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let header = bytes.get(..FRAGMENT_HEADER_LEN).ok_or(Malformed::TooShort {
            expected: FRAGMENT_HEADER_LEN,
            actual: bytes.len(),
        })?;
        let offset_field = u16::from_be_bytes([header[2], header[3]]);

        Ok(Self {
            next_header: header[0],
            offset: offset_field >> 3,
            more_fragments: offset_field & 1 != 0,
            identification: u32::from_be_bytes([header[4], header[5], header[6], header[7]]),
        })
    }

    /// The 16-bit field holding both the offset and the M flag
    #[must_use]
    pub fn offset_field(&self) -> u16 {
        (self.offset << 3) | u16::from(self.more_fragments)
    }

    /// Serializes the header. The reserved bits are always zero.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; FRAGMENT_HEADER_LEN] {
        let mut bytes = [0; FRAGMENT_HEADER_LEN];
        bytes[0] = self.next_header;
        bytes[2..4].copy_from_slice(&self.offset_field().to_be_bytes());
        bytes[4..8].copy_from_slice(&self.identification.to_be_bytes());
        bytes
    }
}

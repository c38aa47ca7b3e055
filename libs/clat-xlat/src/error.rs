use std::net::{Ipv4Addr, Ipv6Addr};

/// Ways a packet can fail header validation
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum Malformed {
    #[error("Packet too short. Expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("Wrong IP version. Expected {expected}, got {actual}")]
    BadVersion { expected: u8, actual: u8 },
    #[error("Declared length of {declared} bytes exceeds the {actual} bytes available")]
    LengthExceedsBuffer { declared: usize, actual: usize },
    #[error("Declared length of {declared} bytes is shorter than the {header} byte header")]
    LengthBelowHeader { declared: usize, header: usize },
    #[error("Invalid TCP data offset: {0} words")]
    BadTcpDataOffset(u8),
    #[error("Translated packet would be {length} bytes, more than the {max} byte limit")]
    TooLong { length: usize, max: usize },
    #[error("Unexpected ethertype: {0:#06x}")]
    UnexpectedEtherType(u16),
}

/// Traffic the engine does not know how to translate
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum Unsupported {
    #[error("protocol {0}")]
    Protocol(u8),
    #[error("UDP fragment without a checksum")]
    UdpFragmentWithoutChecksum,
}

/// Ways a packet can fail to match the address mapping table
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum Unmapped {
    #[error(transparent)]
    Device(#[from] clat_map::Error),
    #[error("Destination {0} is a multicast address")]
    Multicast(Ipv6Addr),
    #[error("Source {0} is not the device's client address")]
    UnknownSource(Ipv4Addr),
    #[error("Destination {0} is not the device's client address")]
    UnknownDestination(Ipv6Addr),
}

/// All reasons the engine can refuse to translate a packet.
///
/// Every one of these is raised before the packet buffer is modified.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum RejectReason {
    #[error("Malformed header: {0}")]
    MalformedHeader(#[from] Malformed),
    #[error("Unsupported: {0}")]
    UnsupportedProtocol(#[from] Unsupported),
    #[error("Address not mapped: {0}")]
    AddressNotMapped(#[from] Unmapped),
    #[error("Buffer too small. Need {needed} bytes of headroom, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

impl From<clat_map::Error> for RejectReason {
    fn from(error: clat_map::Error) -> Self {
        Self::AddressNotMapped(Unmapped::Device(error))
    }
}

/// Result type for `clat-xlat`
pub type Result<T> = std::result::Result<T, RejectReason>;

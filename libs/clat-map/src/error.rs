/// All possible errors thrown by `clat-map` functions
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("Device index {index} is out of range. The table holds {devices} devices")]
    DeviceOutOfRange { index: usize, devices: usize },
    #[error("Device {0} has no address mapping configured")]
    DeviceNotConfigured(usize),
    #[error("Device {0} has an address mapping, but translation is disabled")]
    DeviceDisabled(usize),
    #[error("Invalid PLAT prefix length: {0}. Must be 96")]
    InvalidPrefixLength(u8),
    #[error("Invalid control address {0:?}. Expected <ipv6 address>@<device>")]
    InvalidControlAddress(String),
}

/// Result type for `clat-map`
pub type Result<T> = std::result::Result<T, Error>;

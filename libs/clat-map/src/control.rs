//! The textual `<ipv6>@<device>` form used by the configuration store

use std::{fmt, net::Ipv6Addr, str::FromStr};

use crate::error::Error;

/// An IPv6 address bound to a named device, written as `<ipv6 literal>@<device>`.
///
/// For example, `64:ff9b::@rmnet0` assigns the well-known PLAT prefix through `rmnet0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ControlAddress {
    /// The IPv6 address
    pub address: Ipv6Addr,
    /// The device token following the `@`
    pub device: String,
}

impl ControlAddress {
    /// Construct a new `ControlAddress`
    pub fn new(address: Ipv6Addr, device: impl Into<String>) -> Self {
        Self {
            address,
            device: device.into(),
        }
    }
}

impl FromStr for ControlAddress {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        // Values written through attribute files usually carry a trailing newline
        let trimmed = string.trim();
        let invalid = || Error::InvalidControlAddress(trimmed.to_string());

        let (address, device) = trimmed.split_once('@').ok_or_else(invalid)?;
        if device.is_empty() || device.contains(char::is_whitespace) {
            return Err(invalid());
        }

        Ok(Self {
            address: address.parse().map_err(|_| invalid())?,
            device: device.to_string(),
        })
    }
}

impl fmt::Display for ControlAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address, self.device)
    }
}

impl TryFrom<String> for ControlAddress {
    type Error = Error;

    fn try_from(string: String) -> Result<Self, Self::Error> {
        string.parse()
    }
}

impl From<ControlAddress> for String {
    fn from(control: ControlAddress) -> Self {
        control.to_string()
    }
}

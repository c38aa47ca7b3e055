//! The JSON file describing the address mapping table

use std::{net::Ipv4Addr, path::Path};

use clat_map::{ControlAddress, MappingTable, DEFAULT_DEVICE_COUNT};

/// Ways loading the config can fail
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid mapping: {0}")]
    Mapping(#[from] clat_map::Error),
}

/// Address mapping for a single device
#[derive(Debug, serde::Deserialize, Clone)]
pub struct DeviceConfig {
    /// Slot in the mapping table
    pub index: usize,
    /// Client IPv6 address, and the interface translated packets are forwarded to
    pub ipv6: ControlAddress,
    /// IPv4 address synthesized for the device
    pub ipv4: Ipv4Addr,
    /// Whether translation is active
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Representation of the `clatxlat.json` config file
#[derive(Debug, serde::Deserialize, Clone)]
pub struct Config {
    /// The PLAT prefix, in `<prefix>@<device>` form
    pub plat: ControlAddress,
    /// Number of device slots in the table
    #[serde(default = "default_device_count")]
    pub device_count: usize,
    /// Per-device mappings
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

fn default_enabled() -> bool {
    true
}

fn default_device_count() -> usize {
    DEFAULT_DEVICE_COUNT
}

impl Config {
    /// Load the config from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Builds the mapping table this config describes
    pub fn build_table(&self) -> Result<MappingTable, ConfigError> {
        let mut table = MappingTable::new(self.device_count);

        table.set_plat_prefix(self.plat.address);
        if table.plat_prefix() != self.plat.address {
            log::warn!(
                "Ignoring the low 32 bits of PLAT prefix {}, using {}/96",
                self.plat.address,
                table.plat_prefix()
            );
        }

        for device in &self.devices {
            table.set_device_mapping(
                device.index,
                device.ipv6.address,
                device.ipv4,
                device.enabled,
            )?;
            table.set_forwarding_target(device.index, Some(device.ipv6.device.clone()))?;
            log::debug!(
                "Device {}: {} <-> {} via {}",
                device.index,
                device.ipv4,
                device.ipv6.address,
                device.ipv6.device
            );
        }

        Ok(table)
    }
}

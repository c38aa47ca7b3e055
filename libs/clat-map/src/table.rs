use std::net::{Ipv4Addr, Ipv6Addr};

use ipnet::Ipv6Net;

use crate::error::{Error, Result};

/// Number of device slots in a table built with [`MappingTable::default`]
pub const DEFAULT_DEVICE_COUNT: usize = 4;

/// The only PLAT prefix length this table understands
pub const PLAT_PREFIX_LEN: u8 = 96;

/// Selects the bits of an address covered by the PLAT prefix
const PLAT_PREFIX_MASK: u128 = !0xffff_ffff;

/// Translation state for one logical network device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMapping {
    /// Whether translation is active for this device
    pub enabled: bool,
    /// The address this device's IPv6 traffic is anchored to
    pub client_ipv6: Ipv6Addr,
    /// The IPv4 address synthesized for this device
    pub client_ipv4: Ipv4Addr,
    /// Name of the interface translated packets are redelivered to
    pub forwarding_target: Option<String>,
}

/// Address mappings for every device, plus the PLAT prefix they share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    /// Top 96 bits of the PLAT prefix. The low 32 bits are always zero.
    plat_prefix: Ipv6Addr,
    /// One slot per device index
    devices: Vec<Option<AddressMapping>>,
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_COUNT)
    }
}

impl MappingTable {
    /// Construct an empty table with `device_count` unconfigured device slots
    #[must_use]
    pub fn new(device_count: usize) -> Self {
        Self {
            plat_prefix: Ipv6Addr::UNSPECIFIED,
            devices: vec![None; device_count],
        }
    }

    /// Number of device slots in this table
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// The configured PLAT prefix
    #[must_use]
    pub fn plat_prefix(&self) -> Ipv6Addr {
        self.plat_prefix
    }

    /// Sets the PLAT prefix. Anything in the low 32 bits of `prefix` is discarded.
    pub fn set_plat_prefix(&mut self, prefix: Ipv6Addr) {
        self.plat_prefix = Ipv6Addr::from(u128::from(prefix) & PLAT_PREFIX_MASK);
    }

    /// Sets the PLAT prefix from a network, which must be a `/96`
    pub fn set_plat_network(&mut self, network: Ipv6Net) -> Result<()> {
        if network.prefix_len() != PLAT_PREFIX_LEN {
            return Err(Error::InvalidPrefixLength(network.prefix_len()));
        }
        self.set_plat_prefix(network.network());
        Ok(())
    }

    /// Replaces the address mapping of one device.
    ///
    /// A forwarding target attached to a previous mapping of the same device is kept.
    pub fn set_device_mapping(
        &mut self,
        device_index: usize,
        client_ipv6: Ipv6Addr,
        client_ipv4: Ipv4Addr,
        enabled: bool,
    ) -> Result<()> {
        let slot = self.slot_mut(device_index)?;
        let forwarding_target = slot
            .take()
            .and_then(|previous| previous.forwarding_target);
        *slot = Some(AddressMapping {
            enabled,
            client_ipv6,
            client_ipv4,
            forwarding_target,
        });
        Ok(())
    }

    /// Attaches (or clears) the interface a configured device forwards translated packets to
    pub fn set_forwarding_target(
        &mut self,
        device_index: usize,
        target: Option<String>,
    ) -> Result<()> {
        match self.slot_mut(device_index)? {
            Some(mapping) => {
                mapping.forwarding_target = target;
                Ok(())
            }
            None => Err(Error::DeviceNotConfigured(device_index)),
        }
    }

    /// Removes a device's mapping entirely
    pub fn clear_device(&mut self, device_index: usize) -> Result<()> {
        *self.slot_mut(device_index)? = None;
        Ok(())
    }

    /// Looks up the mapping of a device, whether or not it is enabled
    pub fn device(&self, device_index: usize) -> Result<&AddressMapping> {
        self.devices
            .get(device_index)
            .ok_or(Error::DeviceOutOfRange {
                index: device_index,
                devices: self.devices.len(),
            })?
            .as_ref()
            .ok_or(Error::DeviceNotConfigured(device_index))
    }

    /// Looks up the mapping of a device that has translation enabled
    pub fn enabled_device(&self, device_index: usize) -> Result<&AddressMapping> {
        let mapping = self.device(device_index)?;
        if !mapping.enabled {
            return Err(Error::DeviceDisabled(device_index));
        }
        Ok(mapping)
    }

    /// Iterates over all configured devices and their indices
    pub fn devices(&self) -> impl Iterator<Item = (usize, &AddressMapping)> {
        self.devices
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|mapping| (index, mapping)))
    }

    /// Checks if an address lies within the PLAT prefix
    #[must_use]
    pub fn is_client_v6(&self, addr: &Ipv6Addr) -> bool {
        u128::from(*addr) & PLAT_PREFIX_MASK == u128::from(self.plat_prefix)
    }

    /// Extracts the IPv4 address embedded in `addr`, if it lies within the PLAT prefix.
    ///
    /// `None` means the address cannot be collapsed to IPv4 directly.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn v4_from_v6(&self, addr: &Ipv6Addr) -> Option<Ipv4Addr> {
        self.is_client_v6(addr)
            .then(|| Ipv4Addr::from(u128::from(*addr) as u32))
    }

    /// Builds the IPv6 address an IPv4 address is translated to on behalf of a device.
    ///
    /// The device's own IPv4 address maps to its configured client IPv6 address. Every other
    /// address is embedded in the low 32 bits of the PLAT prefix.
    pub fn v6_from_v4(&self, device_index: usize, addr: Ipv4Addr) -> Result<Ipv6Addr> {
        let mapping = self.device(device_index)?;
        if mapping.client_ipv4 == addr {
            return Ok(mapping.client_ipv6);
        }
        Ok(self.embed(addr))
    }

    /// Embeds an IPv4 address in the PLAT prefix
    #[must_use]
    pub fn embed(&self, addr: Ipv4Addr) -> Ipv6Addr {
        Ipv6Addr::from(u128::from(self.plat_prefix) | u128::from(u32::from(addr)))
    }

    fn slot_mut(&mut self, device_index: usize) -> Result<&mut Option<AddressMapping>> {
        let devices = self.devices.len();
        self.devices
            .get_mut(device_index)
            .ok_or(Error::DeviceOutOfRange {
                index: device_index,
                devices,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_table() -> MappingTable {
        let mut table = MappingTable::default();
        table.set_plat_prefix("64:ff9b::".parse().unwrap());
        table
            .set_device_mapping(
                0,
                "2001:db8:a::464".parse().unwrap(),
                "192.0.0.4".parse().unwrap(),
                true,
            )
            .unwrap();
        table
            .set_device_mapping(
                1,
                "2001:db8:b::464".parse().unwrap(),
                "192.0.0.5".parse().unwrap(),
                false,
            )
            .unwrap();
        table
    }

    #[test]
    fn test_prefix_low_bits_are_masked() {
        let mut table = MappingTable::default();
        table.set_plat_prefix("64:ff9b::dead:beef".parse().unwrap());
        assert_eq!(table.plat_prefix(), "64:ff9b::".parse::<Ipv6Addr>().unwrap());
    }

    #[test]
    fn test_set_plat_network() {
        let mut table = MappingTable::default();
        table
            .set_plat_network("2001:db8:64::/96".parse().unwrap())
            .unwrap();
        assert_eq!(
            table.plat_prefix(),
            "2001:db8:64::".parse::<Ipv6Addr>().unwrap()
        );
        assert_eq!(
            table.set_plat_network("64:ff9b::/64".parse().unwrap()),
            Err(Error::InvalidPrefixLength(64))
        );
    }

    #[test]
    fn test_device_lookup() {
        let table = test_table();
        assert_eq!(
            table.device(0).unwrap().client_ipv4,
            "192.0.0.4".parse::<Ipv4Addr>().unwrap()
        );
        assert!(!table.device(1).unwrap().enabled);
        assert_eq!(table.device(2), Err(Error::DeviceNotConfigured(2)));
        assert_eq!(
            table.device(9),
            Err(Error::DeviceOutOfRange {
                index: 9,
                devices: DEFAULT_DEVICE_COUNT
            })
        );
    }

    #[test]
    fn test_enabled_device() {
        let table = test_table();
        assert!(table.enabled_device(0).is_ok());
        assert_eq!(table.enabled_device(1), Err(Error::DeviceDisabled(1)));
    }

    #[test]
    fn test_is_client_v6() {
        let table = test_table();
        assert!(table.is_client_v6(&"64:ff9b::c000:201".parse().unwrap()));
        assert!(!table.is_client_v6(&"64:ff9b:1::c000:201".parse().unwrap()));
        assert!(!table.is_client_v6(&"2001:db8:a::464".parse().unwrap()));
    }

    #[test]
    fn test_v4_from_v6() {
        let table = test_table();
        assert_eq!(
            table.v4_from_v6(&"64:ff9b::c000:201".parse().unwrap()),
            Some("192.0.2.1".parse().unwrap())
        );
        assert_eq!(table.v4_from_v6(&"2001:db8::1".parse().unwrap()), None);
    }

    #[test]
    fn test_v6_from_v4() {
        let table = test_table();
        assert_eq!(
            table.v6_from_v4(0, "198.51.100.7".parse().unwrap()).unwrap(),
            "64:ff9b::c633:6407".parse::<Ipv6Addr>().unwrap()
        );
        assert_eq!(
            table.v6_from_v4(0, "192.0.0.4".parse().unwrap()).unwrap(),
            "2001:db8:a::464".parse::<Ipv6Addr>().unwrap()
        );
        assert_eq!(
            table.v6_from_v4(3, "192.0.0.4".parse().unwrap()),
            Err(Error::DeviceNotConfigured(3))
        );
    }

    #[test]
    fn test_embed_then_extract() {
        let table = test_table();
        let addr: Ipv4Addr = "203.0.113.99".parse().unwrap();
        assert_eq!(table.v4_from_v6(&table.embed(addr)), Some(addr));
    }

    #[test]
    fn test_remapping_keeps_forwarding_target() {
        let mut table = test_table();
        table
            .set_forwarding_target(0, Some("rmnet0".to_string()))
            .unwrap();
        table
            .set_device_mapping(
                0,
                "2001:db8:c::464".parse().unwrap(),
                "192.0.0.6".parse().unwrap(),
                true,
            )
            .unwrap();
        assert_eq!(
            table.device(0).unwrap().forwarding_target.as_deref(),
            Some("rmnet0")
        );
        assert_eq!(
            table.set_forwarding_target(3, None),
            Err(Error::DeviceNotConfigured(3))
        );
    }

    #[test]
    fn test_clear_device() {
        let mut table = test_table();
        table.clear_device(0).unwrap();
        assert_eq!(table.device(0), Err(Error::DeviceNotConfigured(0)));
        assert_eq!(table.devices().count(), 1);
    }
}

use std::{
    net::{Ipv4Addr, Ipv6Addr},
    sync::Arc,
};

use arc_swap::ArcSwap;

use crate::{error::Result, table::MappingTable};

/// The writing side of a shared [`MappingTable`].
///
/// Every update clones the current table, edits the copy, and publishes it whole. Readers holding
/// an older snapshot keep seeing that snapshot until they load again, so a translation call never
/// observes a half-written record.
#[derive(Debug)]
pub struct MappingStore {
    table: Arc<ArcSwap<MappingTable>>,
}

impl MappingStore {
    /// Construct a new store publishing `table`
    #[must_use]
    pub fn new(table: MappingTable) -> Self {
        Self {
            table: Arc::new(ArcSwap::from_pointee(table)),
        }
    }

    /// Get a handle that can load snapshots of this store
    #[must_use]
    pub fn reader(&self) -> MappingReader {
        MappingReader(self.table.clone())
    }

    /// Get the currently published table
    #[must_use]
    pub fn snapshot(&self) -> Arc<MappingTable> {
        self.table.load_full()
    }

    /// Publishes a table with a new PLAT prefix
    pub fn set_plat_prefix(&mut self, prefix: Ipv6Addr) {
        let mut next = MappingTable::clone(&self.table.load_full());
        next.set_plat_prefix(prefix);
        log::debug!("PLAT prefix set to {}/96", next.plat_prefix());
        self.table.store(Arc::new(next));
    }

    /// Publishes a table with a new mapping for one device
    pub fn set_device_mapping(
        &mut self,
        device_index: usize,
        client_ipv6: Ipv6Addr,
        client_ipv4: Ipv4Addr,
        enabled: bool,
    ) -> Result<()> {
        self.update(|table| {
            table.set_device_mapping(device_index, client_ipv6, client_ipv4, enabled)
        })?;
        log::debug!(
            "Device {} mapped {} <-> {} (enabled: {})",
            device_index,
            client_ipv4,
            client_ipv6,
            enabled
        );
        Ok(())
    }

    /// Publishes a table with a new forwarding target for one device
    pub fn set_forwarding_target(
        &mut self,
        device_index: usize,
        target: Option<String>,
    ) -> Result<()> {
        self.update(|table| table.set_forwarding_target(device_index, target))
    }

    /// Publishes a table without one device's mapping
    pub fn clear_device(&mut self, device_index: usize) -> Result<()> {
        self.update(|table| table.clear_device(device_index))
    }

    /// Copy the current table, edit it, and publish the result if the edit succeeded
    fn update<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut MappingTable) -> Result<()>,
    {
        let mut next = MappingTable::clone(&self.table.load_full());
        edit(&mut next)?;
        self.table.store(Arc::new(next));
        Ok(())
    }
}

/// A cheap, clonable handle for loading snapshots of a [`MappingStore`]
#[derive(Debug, Clone)]
pub struct MappingReader(Arc<ArcSwap<MappingTable>>);

impl MappingReader {
    /// Get the currently published table
    #[must_use]
    pub fn snapshot(&self) -> Arc<MappingTable> {
        self.0.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_reader_sees_updates() {
        let mut store = MappingStore::new(MappingTable::default());
        let reader = store.reader();

        store
            .set_device_mapping(
                0,
                "2001:db8::464".parse().unwrap(),
                "192.0.0.4".parse().unwrap(),
                true,
            )
            .unwrap();
        assert!(reader.snapshot().enabled_device(0).is_ok());
    }

    #[test]
    fn test_old_snapshots_are_untouched() {
        let mut store = MappingStore::new(MappingTable::default());
        store.set_plat_prefix("64:ff9b::".parse().unwrap());
        let before = store.snapshot();

        store.set_plat_prefix("2001:db8:64::".parse().unwrap());
        assert_eq!(before.plat_prefix(), "64:ff9b::".parse::<Ipv6Addr>().unwrap());
        assert_eq!(
            store.snapshot().plat_prefix(),
            "2001:db8:64::".parse::<Ipv6Addr>().unwrap()
        );
    }

    #[test]
    fn test_plat_prefix_keeps_devices() {
        let mut store = MappingStore::new(MappingTable::default());
        let reader = store.reader();
        store
            .set_device_mapping(
                0,
                "2001:db8::464".parse().unwrap(),
                "192.0.0.4".parse().unwrap(),
                true,
            )
            .unwrap();
        let before = reader.snapshot();

        store.set_plat_prefix("64:ff9b::".parse().unwrap());
        let after = reader.snapshot();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.plat_prefix(), "64:ff9b::".parse::<Ipv6Addr>().unwrap());
        assert_eq!(after.device(0), before.device(0));
    }

    #[test]
    fn test_failed_update_publishes_nothing() {
        let mut store = MappingStore::new(MappingTable::new(1));
        let before = store.snapshot();

        assert_eq!(
            store.set_device_mapping(
                5,
                "2001:db8::464".parse().unwrap(),
                "192.0.0.4".parse().unwrap(),
                true
            ),
            Err(Error::DeviceOutOfRange {
                index: 5,
                devices: 1
            })
        );
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_concurrent_readers() {
        let mut store = MappingStore::new(MappingTable::default());
        store
            .set_device_mapping(
                0,
                "2001:db8::464".parse().unwrap(),
                "192.0.0.4".parse().unwrap(),
                true,
            )
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reader = store.reader();
                std::thread::spawn(move || {
                    (0..1000).all(|_| {
                        let table = reader.snapshot();
                        let mapping = table.device(0).unwrap();
                        // Records are always either the old or the new mapping, never a mix
                        matches!(
                            (mapping.client_ipv4.octets()[3], mapping.client_ipv6.segments()[7]),
                            (4, 0x464) | (5, 0x465)
                        )
                    })
                })
            })
            .collect();

        for _ in 0..1000 {
            store
                .set_device_mapping(
                    0,
                    "2001:db8::465".parse().unwrap(),
                    "192.0.0.5".parse().unwrap(),
                    true,
                )
                .unwrap();
            store
                .set_device_mapping(
                    0,
                    "2001:db8::464".parse().unwrap(),
                    "192.0.0.4".parse().unwrap(),
                    true,
                )
                .unwrap();
        }

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}

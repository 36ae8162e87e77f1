//! In-memory reference implementations of the device tables.
//!
//! These hold the tables only; mount policy lives with the volume manager.
//! The daemon wiring and the test suites both run on them.

use std::collections::HashMap;

use tracing::debug;

use crate::device::{BlockDevice, DevNo, DeviceKind, Media, MediaKind};
use crate::error::RegistryError;
use crate::registry::{BlockDeviceRegistry, MediaRegistry};

/// HashMap-backed [`BlockDeviceRegistry`].
#[derive(Debug, Default)]
pub struct MemoryBlockDeviceRegistry {
    devices: HashMap<DevNo, BlockDevice>,
    /// Expected partition count per disk, from the disk add event.
    expected_parts: HashMap<DevNo, u32>,
}

impl MemoryBlockDeviceRegistry {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of devices currently tracked.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn resolved_partitions(&self, disk: DevNo) -> usize {
        self.devices
            .values()
            .filter(|d| d.kind == DeviceKind::Partition && d.disk == disk && d.path.is_some())
            .count()
    }
}

impl BlockDeviceRegistry for MemoryBlockDeviceRegistry {
    fn create(
        &mut self,
        parent_disk: Option<DevNo>,
        path: &str,
        devno: DevNo,
        media_path: &str,
        kind: DeviceKind,
    ) -> Result<BlockDevice, RegistryError> {
        if self.devices.contains_key(&devno) {
            return Err(RegistryError::DeviceExists(devno));
        }
        let dev = BlockDevice {
            devno,
            disk: parent_disk.unwrap_or_else(|| devno.disk()),
            kind,
            path: Some(path.to_string()),
            media_path: media_path.to_string(),
        };
        debug!(devno = %devno, kind = ?kind, path = %path, "block device registered");
        self.devices.insert(devno, dev.clone());
        Ok(dev)
    }

    fn create_pending_partition(
        &mut self,
        disk: DevNo,
        devno: DevNo,
        media_path: &str,
    ) -> Result<BlockDevice, RegistryError> {
        if self.devices.contains_key(&devno) {
            return Err(RegistryError::DeviceExists(devno));
        }
        let dev = BlockDevice {
            devno,
            disk,
            kind: DeviceKind::Partition,
            path: None,
            media_path: media_path.to_string(),
        };
        self.devices.insert(devno, dev.clone());
        // Enumeration implies at least this many partitions exist.
        let partitions = self
            .devices
            .values()
            .filter(|d| d.kind == DeviceKind::Partition && d.disk == disk)
            .count() as u32;
        let expected = self.expected_parts.entry(disk).or_insert(0);
        if *expected < partitions {
            *expected = partitions;
        }
        debug!(devno = %devno, disk = %disk, "pending partition registered");
        Ok(dev)
    }

    fn lookup_by_devno(&self, devno: DevNo) -> Option<BlockDevice> {
        self.devices.get(&devno).cloned()
    }

    fn set_device_path(&mut self, devno: DevNo, path: &str) -> Result<(), RegistryError> {
        let dev = self
            .devices
            .get_mut(&devno)
            .ok_or(RegistryError::DeviceNotFound(devno))?;
        dev.path = Some(path.to_string());
        Ok(())
    }

    fn note_expected_partitions(&mut self, disk: DevNo, count: u32) {
        self.expected_parts.insert(disk, count);
    }

    fn pending_partition_count(&self, disk: DevNo) -> usize {
        let expected = self.expected_parts.get(&disk).copied().unwrap_or(0) as usize;
        expected.saturating_sub(self.resolved_partitions(disk))
    }

    fn destroy(&mut self, devno: DevNo) -> Result<(), RegistryError> {
        let dev = self
            .devices
            .remove(&devno)
            .ok_or(RegistryError::DeviceNotFound(devno))?;
        if dev.kind == DeviceKind::Disk {
            self.expected_parts.remove(&devno);
        }
        debug!(devno = %devno, "block device destroyed");
        Ok(())
    }
}

/// HashMap-backed [`MediaRegistry`].
#[derive(Debug, Default)]
pub struct MemoryMediaRegistry {
    media: HashMap<String, Media>,
    /// Attached devices per media path, in attach order.
    attached: HashMap<String, Vec<DevNo>>,
}

impl MemoryMediaRegistry {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of media units currently tracked.
    pub fn len(&self) -> usize {
        self.media.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }
}

impl MediaRegistry for MemoryMediaRegistry {
    fn create(
        &mut self,
        path: &str,
        name: &str,
        serial: &str,
        kind: MediaKind,
    ) -> Result<Media, RegistryError> {
        if self.media.contains_key(path) {
            return Err(RegistryError::MediaExists(path.to_string()));
        }
        let media = Media {
            path: path.to_string(),
            name: name.to_string(),
            serial: serial.to_string(),
            kind,
        };
        self.media.insert(path.to_string(), media.clone());
        self.attached.insert(path.to_string(), Vec::new());
        debug!(path = %path, name = %name, kind = ?kind, "media registered");
        Ok(media)
    }

    fn lookup_by_path(&self, path: &str) -> Option<Media> {
        self.media.get(path).cloned()
    }

    fn lookup_by_device(&self, devno: DevNo) -> Option<Media> {
        self.attached
            .iter()
            .find(|(_, devs)| devs.contains(&devno))
            .and_then(|(path, _)| self.media.get(path))
            .cloned()
    }

    fn add_block_device(&mut self, path: &str, devno: DevNo) -> Result<(), RegistryError> {
        let devs = self
            .attached
            .get_mut(path)
            .ok_or_else(|| RegistryError::MediaNotFound(path.to_string()))?;
        if !devs.contains(&devno) {
            devs.push(devno);
        }
        Ok(())
    }

    fn remove_block_device(&mut self, path: &str, devno: DevNo) {
        if let Some(devs) = self.attached.get_mut(path) {
            devs.retain(|d| *d != devno);
        }
    }

    fn attached_devices(&self, path: &str) -> Vec<DevNo> {
        self.attached.get(path).cloned().unwrap_or_default()
    }

    fn destroy(&mut self, path: &str) -> Result<(), RegistryError> {
        self.media
            .remove(path)
            .ok_or_else(|| RegistryError::MediaNotFound(path.to_string()))?;
        self.attached.remove(path);
        debug!(path = %path, "media destroyed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEDIA: &str = "/devices/platform/sdhci.0/mmc_host/mmc0/mmc0:e624";

    #[test]
    fn test_block_create_and_lookup() {
        let mut reg = MemoryBlockDeviceRegistry::new();
        let disk = DevNo::new(179, 0);
        let dev = reg
            .create(None, "/sys/disk", disk, MEDIA, DeviceKind::Disk)
            .unwrap();
        assert_eq!(dev.disk, disk);
        assert_eq!(reg.lookup_by_devno(disk), Some(dev));
        assert_eq!(reg.lookup_by_devno(DevNo::new(179, 1)), None);
    }

    #[test]
    fn test_block_duplicate_create_rejected() {
        let mut reg = MemoryBlockDeviceRegistry::new();
        let disk = DevNo::new(8, 0);
        reg.create(None, "/sys/disk", disk, MEDIA, DeviceKind::Disk)
            .unwrap();
        let err = reg
            .create(None, "/sys/disk", disk, MEDIA, DeviceKind::Disk)
            .unwrap_err();
        assert_eq!(err, RegistryError::DeviceExists(disk));
    }

    #[test]
    fn test_pending_count_from_expected_partitions() {
        let mut reg = MemoryBlockDeviceRegistry::new();
        let disk = DevNo::new(179, 0);
        reg.create(None, "/sys/disk", disk, MEDIA, DeviceKind::Disk)
            .unwrap();
        reg.note_expected_partitions(disk, 2);
        assert_eq!(reg.pending_partition_count(disk), 2);

        reg.create(Some(disk), "/sys/p1", DevNo::new(179, 1), MEDIA, DeviceKind::Partition)
            .unwrap();
        assert_eq!(reg.pending_partition_count(disk), 1);

        reg.create(Some(disk), "/sys/p2", DevNo::new(179, 2), MEDIA, DeviceKind::Partition)
            .unwrap();
        assert_eq!(reg.pending_partition_count(disk), 0);
    }

    #[test]
    fn test_placeholder_completion_resolves_pending() {
        let mut reg = MemoryBlockDeviceRegistry::new();
        let disk = DevNo::new(179, 0);
        let part = DevNo::new(179, 1);
        reg.create(None, "/sys/disk", disk, MEDIA, DeviceKind::Disk)
            .unwrap();
        let placeholder = reg.create_pending_partition(disk, part, MEDIA).unwrap();
        assert_eq!(placeholder.path, None);
        // A placeholder raises the expected count on its own.
        assert_eq!(reg.pending_partition_count(disk), 1);

        reg.set_device_path(part, "/sys/p1").unwrap();
        assert_eq!(reg.pending_partition_count(disk), 0);
        assert_eq!(
            reg.lookup_by_devno(part).unwrap().path.as_deref(),
            Some("/sys/p1")
        );
    }

    #[test]
    fn test_set_path_on_unknown_device() {
        let mut reg = MemoryBlockDeviceRegistry::new();
        let err = reg.set_device_path(DevNo::new(1, 2), "/sys/x").unwrap_err();
        assert_eq!(err, RegistryError::DeviceNotFound(DevNo::new(1, 2)));
    }

    #[test]
    fn test_media_create_lookup_destroy() {
        let mut reg = MemoryMediaRegistry::new();
        reg.create(MEDIA, "SU02G", "0xe624", MediaKind::Sd).unwrap();
        assert!(reg.lookup_by_path(MEDIA).is_some());
        assert!(reg.lookup_by_path("/devices/other").is_none());

        reg.destroy(MEDIA).unwrap();
        assert!(reg.lookup_by_path(MEDIA).is_none());
        assert_eq!(
            reg.destroy(MEDIA).unwrap_err(),
            RegistryError::MediaNotFound(MEDIA.to_string())
        );
    }

    #[test]
    fn test_media_attach_detach() {
        let mut reg = MemoryMediaRegistry::new();
        reg.create(MEDIA, "SU02G", "0xe624", MediaKind::Sd).unwrap();
        let d0 = DevNo::new(179, 0);
        let d1 = DevNo::new(179, 1);

        reg.add_block_device(MEDIA, d0).unwrap();
        reg.add_block_device(MEDIA, d1).unwrap();
        // Re-attach is idempotent.
        reg.add_block_device(MEDIA, d0).unwrap();
        assert_eq!(reg.attached_devices(MEDIA), vec![d0, d1]);
        assert_eq!(reg.lookup_by_device(d1).unwrap().path, MEDIA);

        reg.remove_block_device(MEDIA, d0);
        assert_eq!(reg.attached_devices(MEDIA), vec![d1]);
        assert!(reg.lookup_by_device(d0).is_none());
    }

    #[test]
    fn test_media_attach_to_unknown_media() {
        let mut reg = MemoryMediaRegistry::new();
        let err = reg.add_block_device(MEDIA, DevNo::new(179, 0)).unwrap_err();
        assert_eq!(err, RegistryError::MediaNotFound(MEDIA.to_string()));
    }
}

//! Collaborator interfaces for the device tables.
//!
//! The uevent engine consumes these tables; it does not own their policy.
//! [`memory`] provides HashMap-backed reference implementations used by the
//! daemon wiring and the test suites.

pub mod memory;

use crate::device::{BlockDevice, DevNo, DeviceKind, Media, MediaKind};
use crate::error::RegistryError;

pub use memory::{MemoryBlockDeviceRegistry, MemoryMediaRegistry};

/// The table of block devices known to the daemon.
///
/// Identity is the `(major, minor)` devno. A disk carries the expected
/// partition count for its media; `pending_partition_count` is how many of
/// those partitions have not yet resolved a device path.
pub trait BlockDeviceRegistry: Send {
    /// Register a new block device.
    ///
    /// `parent_disk` is the owning disk's devno where one is already tracked;
    /// for a disk creating itself it is `None` and the device is its own disk.
    fn create(
        &mut self,
        parent_disk: Option<DevNo>,
        path: &str,
        devno: DevNo,
        media_path: &str,
        kind: DeviceKind,
    ) -> Result<BlockDevice, RegistryError>;

    /// Register a placeholder partition discovered during enumeration, before
    /// its add event arrives. Its device path stays unset until then.
    fn create_pending_partition(
        &mut self,
        disk: DevNo,
        devno: DevNo,
        media_path: &str,
    ) -> Result<BlockDevice, RegistryError>;

    /// Look up a device by devno.
    fn lookup_by_devno(&self, devno: DevNo) -> Option<BlockDevice>;

    /// Set or update a device's path (completes a placeholder).
    fn set_device_path(&mut self, devno: DevNo, path: &str) -> Result<(), RegistryError>;

    /// Record how many partitions the disk's media is expected to carry,
    /// as announced by the disk's add event.
    fn note_expected_partitions(&mut self, disk: DevNo, count: u32);

    /// Number of expected partitions of `disk` that have no resolved device
    /// path yet. Zero means the partition set is fully enumerated.
    fn pending_partition_count(&self, disk: DevNo) -> usize;

    /// Drop a device from the table.
    fn destroy(&mut self, devno: DevNo) -> Result<(), RegistryError>;
}

/// The table of removable media units, keyed by canonical sysfs path.
pub trait MediaRegistry: Send {
    /// Register new media.
    fn create(
        &mut self,
        path: &str,
        name: &str,
        serial: &str,
        kind: MediaKind,
    ) -> Result<Media, RegistryError>;

    /// Look up media by its canonical path.
    fn lookup_by_path(&self, path: &str) -> Option<Media>;

    /// Look up the media a block device is attached to.
    fn lookup_by_device(&self, devno: DevNo) -> Option<Media>;

    /// Attach a block device to media.
    fn add_block_device(&mut self, path: &str, devno: DevNo) -> Result<(), RegistryError>;

    /// Detach a block device from media. Detaching an unattached device is a
    /// no-op.
    fn remove_block_device(&mut self, path: &str, devno: DevNo);

    /// Devnos currently attached to the media at `path`.
    fn attached_devices(&self, path: &str) -> Vec<DevNo>;

    /// Drop media from the table.
    fn destroy(&mut self, path: &str) -> Result<(), RegistryError>;
}

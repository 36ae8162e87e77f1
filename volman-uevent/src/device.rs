//! Device identities and snapshots.
//!
//! Block devices are identified by their `(major, minor)` pair; a disk always
//! has minor 0 and its partitions share its major. Media (a removable card)
//! is identified by the canonical sysfs path of its backing device.

use serde::{Deserialize, Serialize};

/// The `(major, minor)` pair identifying a block device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DevNo {
    /// Major device number
    pub major: u32,
    /// Minor device number
    pub minor: u32,
}

impl DevNo {
    /// Create a devno from its parts.
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// The identity of the disk owning this device: `(major, 0)`.
    ///
    /// For a disk this is the identity itself.
    pub fn disk(&self) -> DevNo {
        DevNo::new(self.major, 0)
    }

    /// Whether this devno names a whole disk rather than a partition.
    pub fn is_disk(&self) -> bool {
        self.minor == 0
    }
}

impl std::fmt::Display for DevNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Classification of a block device from the uevent `DEVTYPE` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// A whole physical block device
    Disk,
    /// A sub-range of a disk
    Partition,
}

impl DeviceKind {
    /// Map the `DEVTYPE` uevent value. Any other value is unknown.
    pub fn from_devtype(s: &str) -> Option<Self> {
        match s {
            "disk" => Some(DeviceKind::Disk),
            "partition" => Some(DeviceKind::Partition),
            _ => None,
        }
    }

    /// How many trailing sysfs path components separate a device of this
    /// kind from its backing media.
    ///
    /// A disk lives at `<media>/block/<disk>` (2 below the media), a
    /// partition one level further down. These depths are coupled to the
    /// kernel's sysfs layout for mmc hosts; see the fixture tests.
    pub fn media_depth(&self) -> usize {
        match self {
            DeviceKind::Disk => 2,
            DeviceKind::Partition => 3,
        }
    }
}

/// Snapshot of a tracked block device, as returned by the block-device table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    /// Identity
    pub devno: DevNo,
    /// Identity of the owning disk (`devno` itself for a disk)
    pub disk: DevNo,
    /// Disk or partition
    pub kind: DeviceKind,
    /// Sysfs device path. `None` while this is a placeholder created during
    /// partition enumeration, before its add event arrived.
    pub path: Option<String>,
    /// Canonical path of the backing media
    pub media_path: String,
}

/// Kind of removable media backing a set of block devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    /// SD card
    Sd,
    /// MMC / eMMC card
    Mmc,
}

impl MediaKind {
    /// Map the `MMC_TYPE` uevent value. Card types this daemon does not
    /// manage (e.g. SDIO) map to `None`.
    pub fn from_mmc_type(s: &str) -> Option<Self> {
        match s {
            "SD" => Some(MediaKind::Sd),
            "MMC" => Some(MediaKind::Mmc),
            _ => None,
        }
    }
}

/// Snapshot of a tracked media unit, as returned by the media table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    /// Canonical sysfs path of the backing device (the identity key)
    pub path: String,
    /// Card name, from the `MMC_NAME` uevent parameter
    pub name: String,
    /// Card serial, read from sysfs
    pub serial: String,
    /// Card kind
    pub kind: MediaKind,
}

/// Derive the canonical media-backing path from a block-device event path by
/// stripping `levels` trailing components.
///
/// Returns `None` when the path has too few components to strip, which a
/// caller treats as "no media resolvable here".
pub fn backing_media_path(devpath: &str, levels: usize) -> Option<String> {
    let mut end = devpath.len();
    for _ in 0..levels {
        let cut = devpath[..end].rfind('/')?;
        if cut == 0 {
            return None;
        }
        end = cut;
    }
    Some(devpath[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devno_disk_identity() {
        let part = DevNo::new(179, 2);
        assert_eq!(part.disk(), DevNo::new(179, 0));
        assert!(!part.is_disk());
        assert!(part.disk().is_disk());
        assert_eq!(part.to_string(), "179:2");
    }

    #[test]
    fn test_device_kind_from_devtype() {
        assert_eq!(DeviceKind::from_devtype("disk"), Some(DeviceKind::Disk));
        assert_eq!(
            DeviceKind::from_devtype("partition"),
            Some(DeviceKind::Partition)
        );
        assert_eq!(DeviceKind::from_devtype("tape"), None);
        assert_eq!(DeviceKind::from_devtype(""), None);
    }

    #[test]
    fn test_media_kind_from_mmc_type() {
        assert_eq!(MediaKind::from_mmc_type("SD"), Some(MediaKind::Sd));
        assert_eq!(MediaKind::from_mmc_type("MMC"), Some(MediaKind::Mmc));
        assert_eq!(MediaKind::from_mmc_type("SDIO"), None);
    }

    // Fixture paths mirror a real mmc host sysfs layout. The 2/3 depth
    // constants are coupled to this layout; if these break, the kernel's
    // device tree shape changed underneath us.
    const DISK_PATH: &str =
        "/devices/platform/sdhci.0/mmc_host/mmc0/mmc0:e624/block/mmcblk0";
    const PART_PATH: &str =
        "/devices/platform/sdhci.0/mmc_host/mmc0/mmc0:e624/block/mmcblk0/mmcblk0p1";
    const MEDIA_PATH: &str = "/devices/platform/sdhci.0/mmc_host/mmc0/mmc0:e624";

    #[test]
    fn test_backing_media_path_disk_depth() {
        assert_eq!(
            backing_media_path(DISK_PATH, DeviceKind::Disk.media_depth()),
            Some(MEDIA_PATH.to_string())
        );
    }

    #[test]
    fn test_backing_media_path_partition_depth() {
        assert_eq!(
            backing_media_path(PART_PATH, DeviceKind::Partition.media_depth()),
            Some(MEDIA_PATH.to_string())
        );
    }

    #[test]
    fn test_backing_media_path_disk_and_partition_agree() {
        let from_disk = backing_media_path(DISK_PATH, 2);
        let from_part = backing_media_path(PART_PATH, 3);
        assert_eq!(from_disk, from_part);
    }

    #[test]
    fn test_backing_media_path_too_shallow() {
        assert_eq!(backing_media_path("/devices", 2), None);
        assert_eq!(backing_media_path("/a/b", 3), None);
        assert_eq!(backing_media_path("", 1), None);
    }
}

//! Host-facing collaborator implementations.

use std::path::PathBuf;

use tracing::info;
use volman_uevent::{DevNo, EjectCompletion, HandlerError, SysfsReader, VolumeManager};

/// Reads device attributes from a mounted sysfs.
pub struct FsSysfsReader {
    root: PathBuf,
}

impl FsSysfsReader {
    /// Reader over the standard `/sys` mount.
    pub fn new() -> Self {
        Self::with_root("/sys")
    }

    /// Reader over an alternate root, for tests and chroots.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for FsSysfsReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsReader for FsSysfsReader {
    fn read_attribute(&self, device_path: &str, attr: &str) -> Result<String, HandlerError> {
        let full = self
            .root
            .join(device_path.trim_start_matches('/'))
            .join(attr);
        std::fs::read_to_string(&full)
            .map(|s| s.trim().to_string())
            .map_err(|source| HandlerError::Sysfs {
                path: device_path.to_string(),
                attr: attr.to_string(),
                source,
            })
    }
}

/// Stand-in mount policy: logs disk offers and acknowledges every eject
/// immediately. A real mount engine would unmount first and acknowledge from
/// its own completion path.
#[derive(Debug, Default)]
pub struct ImmediateVolumeManager;

impl VolumeManager for ImmediateVolumeManager {
    fn consider_disk(&mut self, disk: DevNo) -> Result<(), HandlerError> {
        info!(disk = %disk, "disk ready for mount consideration");
        Ok(())
    }

    fn notify_eject(
        &mut self,
        devno: DevNo,
        on_ok_to_destroy: EjectCompletion,
    ) -> Result<(), HandlerError> {
        info!(devno = %devno, "acknowledging eject");
        on_ok_to_destroy(devno);
        Ok(())
    }
}

//! Block-device lifecycle handler.
//!
//! Add events resolve their backing media by truncating the device path,
//! then register (or complete) the block device and attach it to the media.
//! The attach that brings the owning disk's pending-partition count to zero
//! hands the disk to the volume manager: the synchronization barrier that
//! keeps mount consideration from racing partition enumeration, since disk
//! and partition add events may arrive in either order.
//!
//! Remove events start the two-phase removal protocol: the handler only asks
//! the volume manager for an eject acknowledgement; detaching from media and
//! destroying the device happen inside the completion, never here.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::device::{backing_media_path, DevNo, DeviceKind};
use crate::dispatch::SubsystemHandler;
use crate::error::HandlerError;
use crate::event::{Action, Uevent};
use crate::handlers::{SharedBlockDevices, SharedMedia, SharedVolumeManager};
use crate::volmgr::EjectCompletion;

/// Handler for `SUBSYSTEM=block` events.
pub struct BlockHandler {
    blkdevs: SharedBlockDevices,
    media: SharedMedia,
    volmgr: SharedVolumeManager,
}

impl BlockHandler {
    /// Wire a block handler to its collaborators.
    pub fn new(
        blkdevs: SharedBlockDevices,
        media: SharedMedia,
        volmgr: SharedVolumeManager,
    ) -> Self {
        Self {
            blkdevs,
            media,
            volmgr,
        }
    }

    fn handle_add(&self, event: &Uevent) -> Result<(), HandlerError> {
        let devtype = event.require_param("DEVTYPE")?;
        let kind = DeviceKind::from_devtype(devtype)
            .ok_or_else(|| HandlerError::UnknownDeviceType(devtype.to_string()))?;

        // Most add events are for devices this daemon does not manage; no
        // tracked media behind the path means no side effects at all.
        let Some(media_path) = backing_media_path(&event.path, kind.media_depth()) else {
            debug!(path = %event.path, "device path too shallow to resolve media");
            return Ok(());
        };
        let Some(media) = self.media.lock().lookup_by_path(&media_path) else {
            debug!(media_path = %media_path, "no backing media for block device");
            return Ok(());
        };

        let devno = DevNo::new(
            numeric_param(event, "MAJOR")?,
            numeric_param(event, "MINOR")?,
        );
        let disk = devno.disk();

        let (disk_resolved_before, pending_before) = {
            let blkdevs = self.blkdevs.lock();
            let resolved = blkdevs
                .lookup_by_devno(disk)
                .is_some_and(|d| d.path.is_some());
            (resolved, blkdevs.pending_partition_count(disk))
        };

        {
            let mut blkdevs = self.blkdevs.lock();

            if kind == DeviceKind::Disk {
                if let Some(nparts) = event.param("NPARTS") {
                    match nparts.parse::<u32>() {
                        Ok(n) => blkdevs.note_expected_partitions(devno, n),
                        Err(_) => warn!(value = %nparts, "unparseable NPARTS on disk add"),
                    }
                }
            }

            if blkdevs.lookup_by_devno(devno).is_some() {
                // A placeholder created during partition enumeration; the
                // only news is its device path.
                blkdevs.set_device_path(devno, &event.path)?;
            } else {
                let parent = blkdevs.lookup_by_devno(disk).map(|d| d.devno);
                blkdevs.create(parent, &event.path, devno, &media.path, kind)?;
            }
        }

        self.media.lock().add_block_device(&media.path, devno)?;

        info!(
            devno = %devno,
            media = %media.name,
            media_path = %media_path,
            "new block device on media"
        );

        let (disk_resolved_after, pending_after) = {
            let blkdevs = self.blkdevs.lock();
            let resolved = blkdevs
                .lookup_by_devno(disk)
                .is_some_and(|d| d.path.is_some());
            (resolved, blkdevs.pending_partition_count(disk))
        };

        // Fire exactly once: on the attach that completes the set, not on
        // re-announcements of an already-complete disk.
        let newly_complete = disk_resolved_after
            && pending_after == 0
            && (pending_before != 0 || !disk_resolved_before);
        if newly_complete {
            info!(disk = %disk, pending = pending_after, "partition set enumerated, offering disk");
            self.volmgr.lock().consider_disk(disk)?;
        } else {
            debug!(disk = %disk, pending = pending_after, "disk has pending partitions");
        }

        Ok(())
    }

    fn handle_remove(&self, event: &Uevent) -> Result<(), HandlerError> {
        let devno = DevNo::new(
            numeric_param(event, "MAJOR")?,
            numeric_param(event, "MINOR")?,
        );

        let Some(dev) = self.blkdevs.lock().lookup_by_devno(devno) else {
            debug!(devno = %devno, path = %event.path, "remove for untracked block device");
            return Ok(());
        };

        info!(devno = %devno, path = ?dev.path, "block device removal requested");

        // The completion closes over the device identity, not the event: it
        // may fire long after this event is gone. Destruction never happens
        // inside this handler.
        let media = Arc::clone(&self.media);
        let blkdevs = Arc::clone(&self.blkdevs);
        let completion: EjectCompletion = Box::new(move |devno: DevNo| {
            let owner = media.lock().lookup_by_device(devno);
            if let Some(m) = owner {
                media.lock().remove_block_device(&m.path, devno);
            }
            match blkdevs.lock().destroy(devno) {
                Ok(()) => debug!(devno = %devno, "block device destroyed after eject acknowledgement"),
                Err(err) => warn!(devno = %devno, error = %err, "eject completion for unknown device"),
            }
        });

        if let Err(err) = self.volmgr.lock().notify_eject(devno, completion) {
            error!(devno = %devno, error = %err, "volume manager rejected eject notification");
        }
        Ok(())
    }
}

impl SubsystemHandler for BlockHandler {
    fn handle(&self, event: &Uevent) -> Result<(), HandlerError> {
        match event.action {
            Action::Add => self.handle_add(event),
            Action::Remove => self.handle_remove(event),
            // Extension point; nothing to do on in-place changes yet.
            Action::Change => Ok(()),
        }
    }
}

fn numeric_param(event: &Uevent, key: &'static str) -> Result<u32, HandlerError> {
    let value = event.require_param(key)?;
    value.parse().map_err(|_| HandlerError::InvalidParam {
        key,
        value: value.to_string(),
    })
}

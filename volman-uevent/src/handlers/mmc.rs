//! MMC/SD card lifecycle handler.
//!
//! Card insertion creates the media entry that later block events attach to;
//! card removal destroys it. Removal of a card nobody registered is an error
//! — deliberately unlike the block handler, where an untracked remove is
//! routine kernel noise, a card remove for unknown media means our tables
//! have diverged from the kernel's.

use tracing::{debug, error, info, warn};

use crate::device::MediaKind;
use crate::dispatch::SubsystemHandler;
use crate::error::HandlerError;
use crate::event::{Action, Uevent};
use crate::handlers::{SharedMedia, SharedSysfs};

/// Handler for `SUBSYSTEM=mmc` events.
pub struct MmcHandler {
    media: SharedMedia,
    sysfs: SharedSysfs,
}

impl MmcHandler {
    /// Wire an mmc handler to its collaborators.
    pub fn new(media: SharedMedia, sysfs: SharedSysfs) -> Self {
        Self { media, sysfs }
    }

    fn handle_add(&self, event: &Uevent) -> Result<(), HandlerError> {
        let mmc_type = event.require_param("MMC_TYPE")?;
        let Some(kind) = MediaKind::from_mmc_type(mmc_type) else {
            // SDIO and friends are not storage; not ours to track.
            debug!(mmc_type = %mmc_type, path = %event.path, "ignoring non-storage card");
            return Ok(());
        };

        let name = event.require_param("MMC_NAME")?;
        let serial = self.sysfs.read_attribute(&event.path, "serial")?;

        let media = self
            .media
            .lock()
            .create(&event.path, name, &serial, kind)
            .map_err(|err| {
                error!(path = %event.path, error = %err, "unable to allocate new media");
                err
            })?;

        info!(
            name = %media.name,
            serial = %media.serial,
            path = %media.path,
            kind = ?media.kind,
            "new card added"
        );
        Ok(())
    }

    fn handle_remove(&self, event: &Uevent) -> Result<(), HandlerError> {
        let Some(media) = self.media.lock().lookup_by_path(&event.path) else {
            error!(path = %event.path, "remove for unregistered media");
            return Err(HandlerError::MediaNotFound(event.path.clone()));
        };

        let attached = self.media.lock().attached_devices(&event.path);
        if !attached.is_empty() {
            let devnos: Vec<String> = attached.iter().map(ToString::to_string).collect();
            warn!(
                path = %event.path,
                attached = ?devnos,
                "unsafe removal: card destroyed with block devices still attached"
            );
        }

        info!(name = %media.name, serial = %media.serial, path = %media.path, "card removed");
        self.media.lock().destroy(&event.path)?;
        Ok(())
    }
}

impl SubsystemHandler for MmcHandler {
    fn handle(&self, event: &Uevent) -> Result<(), HandlerError> {
        match event.action {
            Action::Add => self.handle_add(event),
            Action::Remove => self.handle_remove(event),
            Action::Change => {
                debug!(path = %event.path, "no mmc change handling implemented");
                Ok(())
            }
        }
    }
}

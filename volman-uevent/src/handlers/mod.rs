//! Subsystem handlers.
//!
//! Each handler owns shared handles to the collaborators it needs. The
//! handles are `Arc<Mutex<…>>` so the block handler's eject completion can
//! keep the tables alive after the triggering event is gone; processing
//! itself is single-threaded and the locks are uncontended.

mod block;
mod misc;
mod mmc;
mod switch;

pub use block::BlockHandler;
pub use misc::{DumpHandler, NoopHandler};
pub use mmc::MmcHandler;
pub use switch::SwitchHandler;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::dispatch::Dispatcher;
use crate::registry::{BlockDeviceRegistry, MediaRegistry};
use crate::sysfs::SysfsReader;
use crate::ums::UsbMassStorage;
use crate::volmgr::VolumeManager;

/// Shared handle to the block-device table.
pub type SharedBlockDevices = Arc<Mutex<dyn BlockDeviceRegistry>>;
/// Shared handle to the media table.
pub type SharedMedia = Arc<Mutex<dyn MediaRegistry>>;
/// Shared handle to the volume manager.
pub type SharedVolumeManager = Arc<Mutex<dyn VolumeManager>>;
/// Shared handle to the USB mass-storage collaborator.
pub type SharedUms = Arc<Mutex<dyn UsbMassStorage>>;
/// Shared handle to the sysfs attribute reader.
pub type SharedSysfs = Arc<dyn SysfsReader>;

/// The collaborator handles the standard handler set is wired from.
pub struct Collaborators {
    /// Block-device table
    pub blkdevs: SharedBlockDevices,
    /// Media table
    pub media: SharedMedia,
    /// Volume manager
    pub volmgr: SharedVolumeManager,
    /// USB mass-storage state
    pub ums: SharedUms,
    /// Sysfs attribute reader
    pub sysfs: SharedSysfs,
}

/// Build a dispatcher with the full production handler table:
/// switch, battery, mmc, block, bdi, power_supply.
pub fn standard_dispatcher(collab: Collaborators) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("switch", Box::new(SwitchHandler::new(collab.ums)));
    dispatcher.register("battery", Box::new(DumpHandler));
    dispatcher.register(
        "mmc",
        Box::new(MmcHandler::new(Arc::clone(&collab.media), collab.sysfs)),
    );
    dispatcher.register(
        "block",
        Box::new(BlockHandler::new(collab.blkdevs, collab.media, collab.volmgr)),
    );
    dispatcher.register("bdi", Box::new(NoopHandler));
    dispatcher.register("power_supply", Box::new(DumpHandler));
    dispatcher
}

//! Volume-manager collaborator interface.
//!
//! Mount policy lives outside this crate. The engine hands fully-enumerated
//! disks over for mount consideration, and asks for eject acknowledgement
//! through a two-phase removal protocol: the Remove handler requests the
//! eject, and destruction happens only inside the completion the volume
//! manager invokes at a time of its own choosing.

use crate::device::DevNo;
use crate::error::HandlerError;

/// Completion invoked by the volume manager once a block device may be
/// destroyed.
///
/// Closes over the device identity, never the triggering event: it may fire
/// long after that event has been dispatched and discarded.
pub type EjectCompletion = Box<dyn FnOnce(DevNo) + Send>;

/// Mount-policy collaborator consumed by the block handler.
pub trait VolumeManager: Send {
    /// Offer a disk whose partition set is fully enumerated for mount
    /// consideration.
    fn consider_disk(&mut self, disk: DevNo) -> Result<(), HandlerError>;

    /// Announce that a block device is going away. The volume manager must
    /// invoke `on_ok_to_destroy` exactly once, when unmounting (or whatever
    /// policy applies) has finished; only then is the device destroyed.
    fn notify_eject(
        &mut self,
        devno: DevNo,
        on_ok_to_destroy: EjectCompletion,
    ) -> Result<(), HandlerError>;
}

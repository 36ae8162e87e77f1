//! Switch-class event handler.
//!
//! The only switch this daemon acts on is `usb_mass_storage`: its state
//! announces whether a USB host is on the other end of the cable.

use tracing::info;

use crate::dispatch::SubsystemHandler;
use crate::error::HandlerError;
use crate::event::Uevent;
use crate::handlers::SharedUms;

/// Handler for `SUBSYSTEM=switch` events.
pub struct SwitchHandler {
    ums: SharedUms,
}

impl SwitchHandler {
    /// Wire a switch handler to the USB mass-storage state.
    pub fn new(ums: SharedUms) -> Self {
        Self { ums }
    }
}

impl SubsystemHandler for SwitchHandler {
    fn handle(&self, event: &Uevent) -> Result<(), HandlerError> {
        let name = event.require_param("SWITCH_NAME")?;
        let state = event.require_param("SWITCH_STATE")?;

        if name == "usb_mass_storage" {
            // Anything other than "online" means no host.
            let connected = state == "online";
            self.ums.lock().set_host_connected(connected);
        } else {
            info!(switch = %name, state = %state, "ignoring switch");
        }
        Ok(())
    }
}

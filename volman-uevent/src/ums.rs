//! USB mass-storage sharing state.
//!
//! The gadget itself (sysfs lun-file writes) is a collaborator behind
//! [`UsbMassStorage`]; this module owns only the process-scoped flags: is a
//! host connected, and is sharing currently enabled. They live in an explicit
//! state object handed to the switch handler, never in globals.

use tracing::info;

/// Collaborator notified of host connection transitions.
pub trait UsbMassStorage: Send {
    /// A USB host was connected (`true`) or disconnected (`false`).
    fn set_host_connected(&mut self, connected: bool);
}

/// Process-scoped USB mass-storage state.
///
/// Both flags start `false`. Disconnecting the host always clears the
/// enabled flag: sharing cannot survive without a host.
#[derive(Debug, Default)]
pub struct UmsState {
    host_connected: bool,
    enabled: bool,
}

impl UmsState {
    /// Fresh state: no host, sharing disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a USB host is currently connected.
    pub fn host_connected(&self) -> bool {
        self.host_connected
    }

    /// Whether mass-storage sharing is currently enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable sharing. Callers gate this on a connected host.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl UsbMassStorage for UmsState {
    fn set_host_connected(&mut self, connected: bool) {
        info!(connected, "usb mass-storage host connection changed");
        self.host_connected = connected;
        if !connected {
            self.enabled = false;
        }
    }
}

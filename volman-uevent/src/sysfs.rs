//! Sysfs attribute reader collaborator.

use crate::error::HandlerError;

/// Reads device attributes from sysfs (or a stand-in, under test).
pub trait SysfsReader: Send + Sync {
    /// Read the attribute `attr` of the device at `device_path`, trimmed of
    /// trailing whitespace.
    fn read_attribute(&self, device_path: &str, attr: &str) -> Result<String, HandlerError>;
}

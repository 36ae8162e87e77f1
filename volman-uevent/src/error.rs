//! Error types for the volman-uevent crate.

use crate::device::DevNo;

/// Errors from decoding a raw uevent buffer.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// The buffer contained no data at all
    #[error("empty uevent buffer")]
    EmptyBuffer,

    /// The header string carried no `@` separator
    #[error("uevent header has no '@' separator")]
    MissingDelimiter,

    /// The device path after `@` was empty
    #[error("uevent header has an empty device path")]
    EmptyDevicePath,

    /// The message carried no ACTION field
    #[error("uevent has no ACTION field")]
    MissingAction,

    /// The ACTION value matched none of add/remove/change
    #[error("unrecognized uevent action '{0}'")]
    UnknownAction(String),

    /// The message carried no SUBSYSTEM field
    #[error("uevent has no SUBSYSTEM field")]
    MissingSubsystem,
}

/// Errors from the block-device and media tables.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A block device with this devno is already registered
    #[error("block device {0} already registered")]
    DeviceExists(DevNo),

    /// No block device with this devno is registered
    #[error("block device {0} not registered")]
    DeviceNotFound(DevNo),

    /// Media at this path is already registered
    #[error("media already registered at '{0}'")]
    MediaExists(String),

    /// No media is registered at this path
    #[error("no media registered at '{0}'")]
    MediaNotFound(String),
}

/// Errors from a subsystem handler processing one event.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// DEVTYPE was neither `disk` nor `partition`
    #[error("unknown block device type '{0}'")]
    UnknownDeviceType(String),

    /// A parameter the handler cannot proceed without was absent
    #[error("uevent is missing required parameter '{0}'")]
    MissingParam(&'static str),

    /// A parameter was present but unusable
    #[error("uevent parameter {key} has unusable value '{value}'")]
    InvalidParam {
        /// The parameter key
        key: &'static str,
        /// The offending value
        value: String,
    },

    /// Media lookup failed where the handler treats that as fatal
    #[error("no media registered at '{0}'")]
    MediaNotFound(String),

    /// A collaborator registry call failed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The volume manager rejected the operation
    #[error("volume manager error: {0}")]
    VolumeManager(String),

    /// Reading a sysfs attribute failed
    #[error("sysfs read of '{attr}' under '{path}' failed: {source}")]
    Sysfs {
        /// Device path the read was relative to
        path: String,
        /// Attribute name
        attr: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error for the receive/dispatch pipeline.
#[derive(Debug, thiserror::Error)]
pub enum UeventError {
    /// The message could not be decoded
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A handler failed while consuming the event
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// The inbound transport failed
    #[error("transport receive failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for Results using [`UeventError`].
pub type Result<T> = std::result::Result<T, UeventError>;

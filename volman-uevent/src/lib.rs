//! Kernel hotplug ingestion and block-device lifecycle engine.
//!
//! This crate is the uevent core of the volman storage daemon: it decodes
//! raw kernel hotplug datagrams, routes them by subsystem, and maintains the
//! lifecycle of block devices and the removable media backing them.
//!
//! # Architecture
//!
//! ```text
//! transport → parse::parse_uevent → Dispatcher → SubsystemHandler
//!                                                    │
//!                                     BlockDeviceRegistry / MediaRegistry
//!                                     VolumeManager / SysfsReader / UmsState
//! ```
//!
//! Processing is single-threaded and synchronous. The one asynchronous
//! element is the two-phase removal protocol: a block-device remove only
//! notifies the volume manager, and destruction happens inside the
//! ok-to-destroy completion the volume manager invokes later.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use volman_uevent::{
//!     standard_dispatcher, Collaborators, MemoryBlockDeviceRegistry,
//!     MemoryMediaRegistry, UeventMonitor, UmsState,
//! };
//!
//! let dispatcher = standard_dispatcher(Collaborators {
//!     blkdevs: Arc::new(Mutex::new(MemoryBlockDeviceRegistry::new())),
//!     media: Arc::new(Mutex::new(MemoryMediaRegistry::new())),
//!     volmgr,     // your VolumeManager
//!     ums: Arc::new(Mutex::new(UmsState::new())),
//!     sysfs,      // your SysfsReader
//! });
//! let mut monitor = UeventMonitor::new(dispatcher);
//! monitor.run(&mut netlink_source)?;
//! ```

pub mod device;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod handlers;
pub mod logging;
pub mod monitor;
pub mod parse;
pub mod registry;
pub mod sysfs;
pub mod ums;
pub mod volmgr;

// Event model and parsing
pub use event::{Action, Uevent, UEVENT_PARAMS_SOFT_CAP};
pub use parse::{encode_uevent, parse_uevent};

// Dispatch
pub use dispatch::{Dispatcher, SubsystemHandler};

// Device model
pub use device::{backing_media_path, BlockDevice, DevNo, DeviceKind, Media, MediaKind};

// Registries and collaborators
pub use registry::{
    BlockDeviceRegistry, MediaRegistry, MemoryBlockDeviceRegistry, MemoryMediaRegistry,
};
pub use sysfs::SysfsReader;
pub use ums::{UmsState, UsbMassStorage};
pub use volmgr::{EjectCompletion, VolumeManager};

// Handlers
pub use handlers::{
    standard_dispatcher, BlockHandler, Collaborators, DumpHandler, MmcHandler, NoopHandler,
    SwitchHandler,
};

// Monitor
pub use monitor::{DatagramSource, UeventMonitor, RECV_BUFFER_SIZE};

// Errors
pub use error::{HandlerError, ParseError, RegistryError, Result, UeventError};

// Logging
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};

//! volmand: storage volume management daemon.
//!
//! Listens for kernel hotplug events over netlink, tracks removable media and
//! the block devices it backs, and hands fully-enumerated disks to the volume
//! manager for mount consideration.

#[cfg(target_os = "linux")]
mod netlink;
mod platform;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use tracing::info;

use volman_uevent::{
    init_logging_from_env, standard_dispatcher, Collaborators, MemoryBlockDeviceRegistry,
    MemoryMediaRegistry, UeventMonitor, UmsState,
};

use crate::platform::{FsSysfsReader, ImmediateVolumeManager};

#[derive(Parser)]
#[command(name = "volmand", version, about = "Storage volume management daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Listen for kernel hotplug events and track device lifecycle
    Run,
    /// Feed one synthetic uevent through the engine and exit
    Simulate {
        /// Subsystem tag (block, mmc, switch, ...)
        subsystem: String,
        /// Sysfs device path
        path: String,
        /// Event action: add, remove, or change
        action: String,
        /// KEY=VALUE parameters
        params: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_from_env().context("initializing logging")?;

    match cli.command {
        Command::Run => run(),
        Command::Simulate {
            subsystem,
            path,
            action,
            params,
        } => simulate(&subsystem, &path, &action, &params),
    }
}

/// Wire the full production engine onto in-memory tables.
fn build_monitor() -> UeventMonitor {
    let dispatcher = standard_dispatcher(Collaborators {
        blkdevs: Arc::new(Mutex::new(MemoryBlockDeviceRegistry::new())),
        media: Arc::new(Mutex::new(MemoryMediaRegistry::new())),
        volmgr: Arc::new(Mutex::new(ImmediateVolumeManager)),
        ums: Arc::new(Mutex::new(UmsState::new())),
        sysfs: Arc::new(FsSysfsReader::new()),
    });
    UeventMonitor::new(dispatcher)
}

#[cfg(target_os = "linux")]
fn run() -> anyhow::Result<()> {
    let mut source = netlink::NetlinkSource::open().context("opening netlink uevent socket")?;
    let mut monitor = build_monitor();
    info!(subsystems = ?monitor.dispatcher().subsystems(), "listening for kernel hotplug events");
    monitor.run(&mut source).context("uevent receive loop failed")
}

#[cfg(not(target_os = "linux"))]
fn run() -> anyhow::Result<()> {
    anyhow::bail!("the uevent transport requires a Linux kernel")
}

fn simulate(subsystem: &str, path: &str, action: &str, params: &[String]) -> anyhow::Result<()> {
    let mut monitor = build_monitor();
    let params: Vec<&str> = params.iter().map(String::as_str).collect();
    monitor
        .simulate(subsystem, path, action, &params)
        .context("simulated event was rejected")?;
    info!(subsystem, path, action, "simulated event processed");
    Ok(())
}

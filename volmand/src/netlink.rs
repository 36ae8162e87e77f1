//! Netlink kobject-uevent transport.
//!
//! The kernel broadcasts hotplug events on the `NETLINK_KOBJECT_UEVENT`
//! family, multicast group 1. One datagram is one complete event; the socket
//! is receive-only.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use volman_uevent::DatagramSource;

/// Multicast group the kernel publishes uevents on.
const KERNEL_EVENT_GROUP: u32 = 1;

/// A bound kobject-uevent netlink socket.
pub struct NetlinkSource {
    fd: OwnedFd,
}

impl NetlinkSource {
    /// Open and bind the uevent socket. Requires the privileges to join the
    /// kernel event group (typically root or CAP_NET_ADMIN).
    pub fn open() -> io::Result<Self> {
        // SAFETY: plain socket(2); a negative return maps to io::Error.
        let raw = unsafe {
            libc::socket(
                libc::AF_NETLINK,
                libc::SOCK_DGRAM | libc::SOCK_CLOEXEC,
                libc::NETLINK_KOBJECT_UEVENT,
            )
        };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: `raw` is a fresh descriptor we own exclusively.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        // SAFETY: sockaddr_nl is valid all-zeroes.
        let mut addr: libc::sockaddr_nl = unsafe { std::mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
        addr.nl_pid = std::process::id();
        addr.nl_groups = KERNEL_EVENT_GROUP;

        // SAFETY: addr is a properly initialized sockaddr_nl and the length
        // matches its size.
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                std::ptr::addr_of!(addr).cast::<libc::sockaddr>(),
                std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { fd })
    }
}

impl DatagramSource for NetlinkSource {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            // SAFETY: buf is valid writable memory of the given length.
            let n = unsafe {
                libc::recv(self.fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len(), 0)
            };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

//! Receive loop and simulation entry point.
//!
//! Processing is single-threaded and strictly sequential: receive → parse →
//! dispatch → handler returns, one message at a time. That serialization is
//! load-bearing — the device tables are mutated only from this path, so they
//! need no coordination beyond the handles the eject completion holds.

use tracing::{error, warn};

use crate::dispatch::Dispatcher;
use crate::error::{Result, UeventError};
use crate::event::Action;
use crate::parse::{encode_uevent, parse_uevent};

/// Default receive buffer size. Generous: a uevent datagram is far smaller.
pub const RECV_BUFFER_SIZE: usize = 64 * 1024;

/// Source of raw hotplug datagrams.
///
/// One `recv` returns one complete message; no reply is ever sent.
pub trait DatagramSource {
    /// Receive one datagram into `buf`, returning its length.
    fn recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
}

/// Drives the parse/dispatch pipeline over a datagram source.
pub struct UeventMonitor {
    dispatcher: Dispatcher,
    sim_seqnum: u64,
}

impl UeventMonitor {
    /// Create a monitor over a populated dispatcher.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            sim_seqnum: 0,
        }
    }

    /// Parse and dispatch one raw message.
    pub fn process_message(&self, buf: &[u8]) -> Result<()> {
        let event = parse_uevent(buf)?;
        self.dispatcher.dispatch(&event)?;
        Ok(())
    }

    /// Inject a synthetic event.
    ///
    /// The fields are encoded into the kernel wire format and travel the
    /// identical parse/dispatch path as live messages, so simulated traffic
    /// exercises exactly what production traffic does. An action string
    /// outside add/remove/change is rejected.
    pub fn simulate(
        &mut self,
        subsystem: &str,
        path: &str,
        action: &str,
        params: &[&str],
    ) -> Result<()> {
        if Action::from_wire(action).is_none() {
            return Err(crate::error::ParseError::UnknownAction(action.to_string()).into());
        }
        self.sim_seqnum += 1;
        let buf = encode_uevent(subsystem, path, action, self.sim_seqnum, params);
        self.process_message(&buf)
    }

    /// Receive and process messages until the transport fails.
    ///
    /// A malformed message aborts only itself; a handler error is logged and
    /// the loop continues — the kernel re-announces device state through
    /// later events rather than this daemon retrying. Only a transport IO
    /// error ends the loop.
    pub fn run<S: DatagramSource>(&mut self, source: &mut S) -> Result<()> {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        loop {
            let len = source.recv(&mut buf).map_err(UeventError::Io)?;
            match self.process_message(&buf[..len]) {
                Ok(()) => {}
                Err(UeventError::Parse(err)) => {
                    warn!(error = %err, "discarding malformed uevent");
                }
                Err(err) => {
                    error!(error = %err, "uevent handler failed");
                }
            }
        }
    }

    /// The dispatcher this monitor drives.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::SubsystemHandler;
    use crate::error::{HandlerError, ParseError};
    use crate::event::Uevent;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recording {
        seen: Arc<Mutex<Vec<Uevent>>>,
    }

    impl SubsystemHandler for Recording {
        fn handle(&self, event: &Uevent) -> std::result::Result<(), HandlerError> {
            self.seen.lock().push(event.clone());
            Ok(())
        }
    }

    fn monitor_with_recorder(subsystem: &str) -> (UeventMonitor, Arc<Mutex<Vec<Uevent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(subsystem, Box::new(Recording { seen: Arc::clone(&seen) }));
        (UeventMonitor::new(dispatcher), seen)
    }

    #[test]
    fn test_simulate_routes_through_parser() {
        let (mut monitor, seen) = monitor_with_recorder("mmc");
        monitor
            .simulate("mmc", "/devices/mmc0/mmc0:e624", "add", &["MMC_TYPE=SD"])
            .unwrap();

        let events = seen.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].subsystem, "mmc");
        assert_eq!(events[0].path, "/devices/mmc0/mmc0:e624");
        assert_eq!(events[0].params, vec!["MMC_TYPE=SD"]);
        assert!(events[0].seqnum > 0);
    }

    #[test]
    fn test_simulate_rejects_unknown_action() {
        let (mut monitor, seen) = monitor_with_recorder("mmc");
        let err = monitor
            .simulate("mmc", "/devices/mmc0", "eject", &[])
            .unwrap_err();
        assert!(matches!(
            err,
            UeventError::Parse(ParseError::UnknownAction(a)) if a == "eject"
        ));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_simulation_matches_raw_message() {
        let (mut monitor, seen) = monitor_with_recorder("block");
        let raw =
            b"k@/devices/foo\0ACTION=change\0SEQNUM=1\0SUBSYSTEM=block\0DEVTYPE=disk\0";
        monitor.process_message(raw).unwrap();
        monitor
            .simulate("block", "/devices/foo", "change", &["DEVTYPE=disk"])
            .unwrap();

        let events = seen.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].path, events[1].path);
        assert_eq!(events[0].action, events[1].action);
        assert_eq!(events[0].subsystem, events[1].subsystem);
        assert_eq!(events[0].params, events[1].params);
    }

    /// A source that yields a fixed set of datagrams then fails, so the loop
    /// terminates.
    struct ScriptedSource {
        messages: Vec<Vec<u8>>,
    }

    impl DatagramSource for ScriptedSource {
        fn recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.messages.is_empty() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "source exhausted",
                ));
            }
            let msg = self.messages.remove(0);
            buf[..msg.len()].copy_from_slice(&msg);
            Ok(msg.len())
        }
    }

    #[test]
    fn test_run_survives_malformed_messages() {
        let (mut monitor, seen) = monitor_with_recorder("block");
        let mut source = ScriptedSource {
            messages: vec![
                b"garbage-no-separator\0".to_vec(),
                b"k@/devices/a\0ACTION=add\0SUBSYSTEM=block\0".to_vec(),
                b"\0\0".to_vec(),
                b"k@/devices/b\0ACTION=remove\0SUBSYSTEM=block\0".to_vec(),
            ],
        };

        let err = monitor.run(&mut source).unwrap_err();
        assert!(matches!(err, UeventError::Io(_)));
        // Both well-formed messages made it through despite the garbage.
        assert_eq!(seen.lock().len(), 2);
    }
}

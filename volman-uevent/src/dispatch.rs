//! Subsystem dispatch.
//!
//! The dispatcher holds an ordered subsystem→handler table populated at
//! registration time. Lookup is exact-match on the event's subsystem tag; an
//! event for a subsystem nobody registered is a no-op, because most kernel
//! traffic is of no interest to this daemon.

use tracing::debug;

use crate::error::HandlerError;
use crate::event::Uevent;

/// One subsystem's event logic.
///
/// A handler consumes exactly one event per invocation, synchronously. An
/// error aborts only that event; the dispatcher is reusable afterwards.
pub trait SubsystemHandler: Send {
    /// Consume one event.
    fn handle(&self, event: &Uevent) -> Result<(), HandlerError>;
}

/// Routes parsed events to the handler registered for their subsystem.
#[derive(Default)]
pub struct Dispatcher {
    handlers: Vec<(String, Box<dyn SubsystemHandler>)>,
}

impl Dispatcher {
    /// Create a dispatcher with no registrations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `subsystem`. Registration order is preserved;
    /// the first exact match wins.
    pub fn register(&mut self, subsystem: impl Into<String>, handler: Box<dyn SubsystemHandler>) {
        self.handlers.push((subsystem.into(), handler));
    }

    /// Route one event to its handler.
    ///
    /// Exactly one handler call per event. An unmatched subsystem returns
    /// `Ok` with a debug log only.
    pub fn dispatch(&self, event: &Uevent) -> Result<(), HandlerError> {
        for (subsystem, handler) in &self.handlers {
            if *subsystem == event.subsystem {
                return handler.handle(event);
            }
        }
        debug!(subsystem = %event.subsystem, "no handler registered for subsystem");
        Ok(())
    }

    /// Subsystems currently registered, in registration order.
    pub fn subsystems(&self) -> Vec<&str> {
        self.handlers.iter().map(|(s, _)| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Action;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl SubsystemHandler for Counting {
        fn handle(&self, _event: &Uevent) -> Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(HandlerError::MissingParam("DEVTYPE"))
            } else {
                Ok(())
            }
        }
    }

    fn event_for(subsystem: &str) -> Uevent {
        Uevent {
            path: "/devices/foo".to_string(),
            action: Action::Add,
            subsystem: subsystem.to_string(),
            seqnum: 1,
            params: vec![],
        }
    }

    #[test]
    fn test_dispatch_routes_by_exact_match() {
        let block_calls = Arc::new(AtomicUsize::new(0));
        let mmc_calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(
            "block",
            Box::new(Counting { calls: Arc::clone(&block_calls), fail: false }),
        );
        dispatcher.register(
            "mmc",
            Box::new(Counting { calls: Arc::clone(&mmc_calls), fail: false }),
        );

        dispatcher.dispatch(&event_for("mmc")).unwrap();
        assert_eq!(block_calls.load(Ordering::SeqCst), 0);
        assert_eq!(mmc_calls.load(Ordering::SeqCst), 1);

        // Prefix is not a match.
        dispatcher.dispatch(&event_for("mm")).unwrap();
        assert_eq!(mmc_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unmatched_subsystem_is_noop_success() {
        let dispatcher = Dispatcher::new();
        assert!(dispatcher.dispatch(&event_for("thermal")).is_ok());
    }

    #[test]
    fn test_handler_error_does_not_poison_dispatcher() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(
            "block",
            Box::new(Counting { calls: Arc::clone(&calls), fail: true }),
        );

        assert!(dispatcher.dispatch(&event_for("block")).is_err());
        // The next event still reaches the handler.
        assert!(dispatcher.dispatch(&event_for("block")).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_registration_order_preserved() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("switch", Box::new(Counting { calls: Arc::clone(&calls), fail: false }));
        dispatcher.register("battery", Box::new(Counting { calls: Arc::clone(&calls), fail: false }));
        assert_eq!(dispatcher.subsystems(), vec!["switch", "battery"]);
    }
}

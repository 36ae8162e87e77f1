//! Diagnostic and placeholder handlers.

use crate::dispatch::SubsystemHandler;
use crate::error::HandlerError;
use crate::event::Uevent;

/// Dumps the event at debug level and succeeds.
///
/// Dispatch target for battery and power_supply events.
pub struct DumpHandler;

impl SubsystemHandler for DumpHandler {
    fn handle(&self, event: &Uevent) -> Result<(), HandlerError> {
        event.dump();
        Ok(())
    }
}

/// Accepts the event and does nothing. Dispatch target for bdi events.
pub struct NoopHandler;

impl SubsystemHandler for NoopHandler {
    fn handle(&self, _event: &Uevent) -> Result<(), HandlerError> {
        Ok(())
    }
}

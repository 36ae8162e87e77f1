//! Structured kernel hotplug events.
//!
//! A [`Uevent`] is one parsed kernel message: constructed once per received
//! (or simulated) datagram, consumed synchronously by exactly one handler
//! invocation, then discarded.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HandlerError;

/// Parameter count past which the parser emits a diagnostic.
///
/// The kernel normally sends far fewer; the bound exists only as a signal
/// that something upstream is misbehaving. Entries beyond it are kept, not
/// dropped.
pub const UEVENT_PARAMS_SOFT_CAP: usize = 32;

/// Action announced by a hotplug message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Device appeared
    Add,
    /// Device went away
    Remove,
    /// Device state changed in place
    Change,
}

impl Action {
    /// Map the wire-format action string by exact match.
    ///
    /// Anything other than `add` / `remove` / `change` is unrecognized and
    /// must be rejected by the caller; there is no default.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Action::Add),
            "remove" => Some(Action::Remove),
            "change" => Some(Action::Change),
            _ => None,
        }
    }

    /// The wire-format spelling of this action.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Remove => "remove",
            Action::Change => "change",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// One parsed kernel hotplug message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uevent {
    /// Device path from the message header (the part after `@`), non-empty.
    pub path: String,
    /// What happened to the device.
    pub action: Action,
    /// Subsystem tag used for dispatch (e.g. `block`, `mmc`, `switch`).
    pub subsystem: String,
    /// Kernel sequence number. Informational only: no ordering or dedup
    /// guarantee is derived from it.
    pub seqnum: u64,
    /// Remaining `KEY=VALUE` strings, in arrival order.
    pub params: Vec<String>,
}

impl Uevent {
    /// Look up a parameter value by key.
    ///
    /// Returns the text after `KEY=` for the first matching entry.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter().find_map(|p| {
            let rest = p.strip_prefix(key)?;
            rest.strip_prefix('=')
        })
    }

    /// Look up a parameter the handler cannot proceed without.
    pub fn require_param(&self, key: &'static str) -> Result<&str, HandlerError> {
        self.param(key).ok_or(HandlerError::MissingParam(key))
    }

    /// Log the full event at debug level.
    ///
    /// Used by the diagnostic-dump handlers (battery, power_supply).
    pub fn dump(&self) {
        debug!(
            seqnum = self.seqnum,
            subsystem = %self.subsystem,
            action = %self.action,
            path = %self.path,
            "uevent"
        );
        for p in &self.params {
            debug!("  {}", p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Uevent {
        Uevent {
            path: "/devices/foo".to_string(),
            action: Action::Add,
            subsystem: "block".to_string(),
            seqnum: 7,
            params: vec![
                "DEVTYPE=disk".to_string(),
                "MAJOR=8".to_string(),
                "MINOR=0".to_string(),
            ],
        }
    }

    #[test]
    fn test_action_from_wire() {
        assert_eq!(Action::from_wire("add"), Some(Action::Add));
        assert_eq!(Action::from_wire("remove"), Some(Action::Remove));
        assert_eq!(Action::from_wire("change"), Some(Action::Change));
        assert_eq!(Action::from_wire("ADD"), None);
        assert_eq!(Action::from_wire("online"), None);
        assert_eq!(Action::from_wire(""), None);
    }

    #[test]
    fn test_param_lookup() {
        let event = sample();
        assert_eq!(event.param("DEVTYPE"), Some("disk"));
        assert_eq!(event.param("MAJOR"), Some("8"));
        assert_eq!(event.param("NPARTS"), None);
    }

    #[test]
    fn test_param_requires_full_key_match() {
        let mut event = sample();
        event.params.push("MAJORITY=yes".to_string());
        // "MAJOR" must not match the "MAJORITY=" entry.
        assert_eq!(event.param("MAJOR"), Some("8"));
        assert_eq!(event.param("MAJORITY"), Some("yes"));
    }

    #[test]
    fn test_require_param_missing() {
        let event = sample();
        let err = event.require_param("MMC_TYPE").unwrap_err();
        assert!(matches!(err, HandlerError::MissingParam("MMC_TYPE")));
    }
}

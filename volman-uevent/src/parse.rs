//! Wire-format decoder for kernel hotplug messages.
//!
//! A uevent datagram is a sequence of NUL-terminated ASCII strings packed
//! contiguously. The first string has the form `<prefix>@<device-path>`;
//! everything up to and including the first `@` is discarded. Each subsequent
//! string is `KEY=VALUE`. `ACTION`, `SEQNUM` and `SUBSYSTEM` are consumed
//! into dedicated fields; everything else lands in `params` in arrival order.
//!
//! The decoder only ever walks the slice it is given, so a truncated or
//! garbage buffer can fail but never over-read.

use tracing::{trace, warn};

use crate::error::ParseError;
use crate::event::{Action, Uevent, UEVENT_PARAMS_SOFT_CAP};

/// Decode a raw uevent buffer into a [`Uevent`].
///
/// `buf` must be exactly the received datagram; traversal is bounded by its
/// length. The kernel pads messages with a trailing NUL, so empty segments
/// are skipped.
pub fn parse_uevent(buf: &[u8]) -> Result<Uevent, ParseError> {
    let mut segments = buf.split(|b| *b == 0);

    let header = segments.next().filter(|s| !s.is_empty()).ok_or(ParseError::EmptyBuffer)?;
    // The '@' search is bounded by the first NUL: a header with no '@' fails
    // here rather than scanning the rest of the buffer.
    let at = header
        .iter()
        .position(|b| *b == b'@')
        .ok_or(ParseError::MissingDelimiter)?;
    let path = String::from_utf8_lossy(&header[at + 1..]).into_owned();
    if path.is_empty() {
        return Err(ParseError::EmptyDevicePath);
    }

    let mut action = None;
    let mut subsystem = None;
    let mut seqnum = 0u64;
    let mut params = Vec::new();

    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        let s = String::from_utf8_lossy(segment);

        if let Some(a) = s.strip_prefix("ACTION=") {
            action = Some(
                Action::from_wire(a).ok_or_else(|| ParseError::UnknownAction(a.to_string()))?,
            );
        } else if let Some(n) = s.strip_prefix("SEQNUM=") {
            // Informational only; a garbled value degrades to 0.
            seqnum = n.parse().unwrap_or_else(|_| {
                trace!(value = %n, "unparseable SEQNUM, using 0");
                0
            });
        } else if let Some(sub) = s.strip_prefix("SUBSYSTEM=") {
            subsystem = Some(sub.to_string());
        } else {
            params.push(s.into_owned());
        }
    }

    if params.len() > UEVENT_PARAMS_SOFT_CAP {
        warn!(
            count = params.len(),
            cap = UEVENT_PARAMS_SOFT_CAP,
            path = %path,
            "uevent parameter count exceeds the expected bound; keeping all"
        );
    }

    Ok(Uevent {
        path,
        action: action.ok_or(ParseError::MissingAction)?,
        subsystem: subsystem.ok_or(ParseError::MissingSubsystem)?,
        seqnum,
        params,
    })
}

/// Encode explicit event fields into the wire format of [`parse_uevent`].
///
/// Used by the simulation entry point so that synthetic events travel the
/// identical decode path as live kernel messages.
pub fn encode_uevent(subsystem: &str, path: &str, action: &str, seqnum: u64, params: &[&str]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64 + params.iter().map(|p| p.len() + 1).sum::<usize>());
    buf.extend_from_slice(b"sim@");
    buf.extend_from_slice(path.as_bytes());
    buf.push(0);
    buf.extend_from_slice(format!("ACTION={action}").as_bytes());
    buf.push(0);
    buf.extend_from_slice(format!("SEQNUM={seqnum}").as_bytes());
    buf.push(0);
    buf.extend_from_slice(format!("SUBSYSTEM={subsystem}").as_bytes());
    buf.push(0);
    for p in params {
        buf.extend_from_slice(p.as_bytes());
        buf.push(0);
    }
    buf
}

//! Contract the registry expects of a session's transport (spec.md §4.4, §6).
//!
//! The registry never performs blocking socket I/O itself. `send` is
//! required to be non-blocking: an implementation hands frames to a channel
//! drained by the session's own writer task, which is where the real,
//! potentially-blocking transport write happens — outside any registry
//! critical section, per spec.md §5's suspension-point rule.

use std::fmt;

use super::frame::ServerFrame;

#[derive(Debug)]
pub struct TransportError;

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport closed")
    }
}

impl std::error::Error for TransportError {}

pub trait Transport: Send + Sync {
    /// Observable open/closed state (spec.md §3 Subscriber).
    fn is_open(&self) -> bool;

    /// Best-effort, non-blocking hand-off of a frame to the session's writer.
    fn send(&self, frame: ServerFrame) -> Result<(), TransportError>;

    /// Close the transport with the given close code/reason (spec.md §6).
    fn close(&self, code: u16, reason: &str);

    /// Issue a transport-level liveness probe (spec.md §4.4 heartbeat).
    /// Distinct from the application-level `ping`/`pong` JSON frames.
    fn ping(&self) {}
}

//! Core traits for the transport seam.

use std::fmt::Debug;

use super::event::{CloseCode, EventSink};
use crate::Result;

/// Readiness of a transport handle, as a socket reports it.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    /// Handshake in progress
    #[default]
    Connecting,
    /// Writable
    Open,
    /// Close requested, waiting for the peer
    Closing,
    /// Closed or never opened
    Closed,
}

impl ReadyState {
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Opens transports on behalf of a [`ConnectionManager`](super::ConnectionManager).
///
/// `open` must not block. The outcome of the handshake, every received text frame and
/// the final close are reported later through `events`.
///
/// # Example
///
/// ```ignore
/// struct Loopback;
///
/// impl Connector for Loopback {
///     fn open(&self, _address: &str, events: EventSink) -> Result<Box<dyn Transport>> {
///         events.open();
///         Ok(Box::new(LoopbackTransport::new(events)))
///     }
/// }
/// ```
pub trait Connector: Send + Sync + 'static {
    /// Start opening a transport to `address`.
    ///
    /// An `Err` means the transport could not even be started (invalid address,
    /// no runtime); it is reported as a connection error.
    fn open(&self, address: &str, events: EventSink) -> Result<Box<dyn Transport>>;
}

/// A single bidirectional text transport.
pub trait Transport: Send + Debug {
    /// Queue a text frame. Only valid while [`ReadyState::Open`].
    fn write(&mut self, text: &str) -> Result<()>;

    fn ready_state(&self) -> ReadyState;

    /// Request closure. The resulting close event may arrive later or not at all.
    fn close(&mut self, code: CloseCode, reason: &str);
}

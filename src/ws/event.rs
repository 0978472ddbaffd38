//! Events raised by a transport and the sink it raises them through.

use tokio::sync::mpsc;

use crate::error::Error;
use crate::{ABNORMAL_CLOSURE, NORMAL_CLOSURE};

/// Identifies one opened transport handle for the lifetime of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// WebSocket close status code (RFC 6455).
///
/// Only [`CloseCode::NORMAL`] counts as an intentional closure; every other code is
/// abnormal and may trigger a reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(u16);

impl CloseCode {
    /// Normal closure; the connection successfully completed.
    pub const NORMAL: Self = Self(NORMAL_CLOSURE);
    /// Endpoint is going away.
    pub const GOING_AWAY: Self = Self(1001);
    /// No status code was present in the close frame.
    pub const NO_STATUS: Self = Self(1005);
    /// Connection dropped without a close frame.
    pub const ABNORMAL: Self = Self(ABNORMAL_CLOSURE);
    /// Server hit an unexpected condition.
    pub const INTERNAL_ERROR: Self = Self(1011);

    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn is_normal(self) -> bool {
        self.0 == NORMAL_CLOSURE
    }
}

impl Default for CloseCode {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// Code and reason carried by a close event.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseFrame {
    pub code: CloseCode,
    pub reason: String,
}

impl CloseFrame {
    pub fn new<S: Into<String>>(code: CloseCode, reason: S) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn normal() -> Self {
        Self::new(CloseCode::NORMAL, "")
    }

    #[must_use]
    pub fn abnormal() -> Self {
        Self::new(CloseCode::ABNORMAL, "")
    }

    #[must_use]
    pub const fn is_normal(&self) -> bool {
        self.code.is_normal()
    }
}

#[derive(Debug)]
pub(crate) enum TransportEvent {
    Open,
    Message(String),
    Close(CloseFrame),
    Error(Error),
}

/// A transport event tagged with the handle that raised it.
#[derive(Debug)]
pub(crate) struct Event {
    pub(crate) handle: HandleId,
    pub(crate) kind: TransportEvent,
}

/// Handed to a [`Connector`](super::Connector) when a transport is opened.
///
/// Every event raised through the sink is queued on the owning manager and handled
/// on its next [`process_next`](super::ConnectionManager::process_next). Events from
/// a handle the manager no longer owns are discarded there.
#[derive(Debug, Clone)]
pub struct EventSink {
    handle: HandleId,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSink {
    pub(crate) const fn new(handle: HandleId, tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { handle, tx }
    }

    #[must_use]
    pub const fn handle(&self) -> HandleId {
        self.handle
    }

    /// The transport finished its handshake and is writable.
    pub fn open(&self) {
        self.emit(TransportEvent::Open);
    }

    /// A text frame arrived.
    pub fn message<S: Into<String>>(&self, text: S) {
        self.emit(TransportEvent::Message(text.into()));
    }

    /// The transport closed. Must be the last event raised for this handle.
    pub fn close(&self, frame: CloseFrame) {
        self.emit(TransportEvent::Close(frame));
    }

    pub fn error(&self, error: Error) {
        self.emit(TransportEvent::Error(error));
    }

    /// Whether the owning manager has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn emit(&self, kind: TransportEvent) {
        // The manager is gone, nobody is left to observe the event.
        _ = self.tx.send(Event {
            handle: self.handle,
            kind,
        });
    }
}

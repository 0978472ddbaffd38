#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};

use super::config::{ReconnectConfig, SessionConfig};
use super::dispatcher::EventDispatcher;
use super::error::WsError;
use super::event::{CloseCode, CloseFrame, Event, EventSink, HandleId, TransportEvent};
use super::log::{Message, MessageLog, Payload};
use super::reconnect::{PendingReconnect, ReconnectPolicy, Schedule};
use super::traits::{Connector, ReadyState, Transport};
use crate::Result;
use crate::error::{Error, Kind};

/// Broadcast channel capacity for logged messages.
const BROADCAST_CAPACITY: usize = 1024;

/// Connection state tracking.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected
    #[default]
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Successfully connected
    Connected,
    /// Waiting to reconnect after an abnormal close
    Reconnecting,
    /// The transport failed or reconnection gave up. Cleared by the next `connect`.
    Error,
}

impl ConnectionState {
    /// Check if the connection is currently active.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    #[must_use]
    pub const fn is_connecting(self) -> bool {
        matches!(self, Self::Connecting)
    }

    #[must_use]
    pub const fn is_reconnecting(self) -> bool {
        matches!(self, Self::Reconnecting)
    }
}

struct ActiveTransport {
    id: HandleId,
    inner: Box<dyn Transport>,
}

enum Wake {
    Event(Event),
    Reconnect,
}

/// Manages a single WebSocket connection, its reconnection and its message history.
///
/// All operations are synchronous and return immediately. Transport events are queued
/// and handled when the host awaits [`process_next`](Self::process_next) (or calls
/// [`process_pending`](Self::process_pending)), one at a time and to completion. Session
/// callbacks receive the manager itself, already updated, and may call back into it.
///
/// # Example
///
/// ```ignore
/// let mut manager = ConnectionManager::new(TungsteniteConnector::default());
/// let config = SessionConfig::default()
///     .with_auto_reconnect(true)
///     .on_message(|manager, message| {
///         println!("received {:?}", message.payload);
///         manager.send("ack");
///     });
///
/// manager.connect("wss://example.com/ws", config);
/// loop {
///     manager.process_next().await;
/// }
/// ```
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    /// Holds the one stored [`ConnectionState`]; every derived flag reads it
    state_tx: watch::Sender<ConnectionState>,
    /// Handed to transports inside their [`EventSink`]
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    /// Broadcast sender for every logged message
    broadcast_tx: broadcast::Sender<Message>,
    transport: Option<ActiveTransport>,
    next_handle: u64,
    session: Option<EventDispatcher>,
    /// Bumped whenever a session is opened or torn down
    generation: u64,
    reconnect: ReconnectPolicy,
    log: MessageLog,
    last_error: Option<String>,
}

#[cfg(feature = "tungstenite")]
impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(super::tungstenite::TungsteniteConnector::default())
    }
}

impl ConnectionManager {
    /// Create a disconnected manager that opens transports through `connector`.
    pub fn new<C: Connector>(connector: C) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            connector: Arc::new(connector),
            state_tx,
            events_tx,
            events_rx,
            broadcast_tx,
            transport: None,
            next_handle: 0,
            session: None,
            generation: 0,
            reconnect: ReconnectPolicy::default(),
            log: MessageLog::new(),
            last_error: None,
        }
    }

    /// Start a new session against `address`.
    ///
    /// Any current transport is dropped and any pending reconnect is cancelled. Failures
    /// are never returned: they move the manager to [`ConnectionState::Error`] and reach
    /// the session's `on_error`.
    pub fn connect<A: Into<String>>(&mut self, address: A, config: SessionConfig) {
        let session = EventDispatcher::new(address.into(), config);

        #[cfg(feature = "tracing")]
        tracing::info!(address = %session.address(), "Connecting WebSocket");

        self.reconnect.reset();
        self.open(session);
    }

    /// Close with the normal closure code and an empty reason.
    pub fn disconnect(&mut self) {
        self.disconnect_with(CloseCode::NORMAL, "");
    }

    /// Cancel any pending reconnect, close the transport and move to `Disconnected`.
    ///
    /// The close event of the released transport is not delivered to the session.
    pub fn disconnect_with(&mut self, code: CloseCode, reason: &str) {
        let cancelled = self.reconnect.cancel();
        if let Some(mut transport) = self.transport.take() {
            transport.inner.close(code, reason);
        }
        self.generation = self.generation.wrapping_add(1);
        self.reconnect.reset();
        self.set_state(ConnectionState::Disconnected);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            code = code.as_u16(),
            reason,
            cancelled_reconnect = cancelled,
            "WebSocket disconnected"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = &cancelled;
    }

    /// Send a text or JSON payload. Returns `false` when nothing was written; the reason
    /// is then available from [`last_error`](Self::last_error).
    pub fn send<P: Into<Payload>>(&mut self, payload: P) -> bool {
        match self.try_send(payload.into()) {
            Ok(()) => true,
            Err(e) => {
                self.fail_send(&e);
                false
            }
        }
    }

    /// Serialize `value` to JSON and send it.
    pub fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) -> bool {
        match serde_json::to_value(value) {
            Ok(value) => self.send(Payload::Json(value)),
            Err(e) => {
                self.fail_send(&Error::from(e));
                false
            }
        }
    }

    fn try_send(&mut self, payload: Payload) -> Result<()> {
        let state = self.state();
        let transport = self
            .transport
            .as_mut()
            .filter(|transport| state.is_connected() && transport.inner.ready_state().is_open())
            .ok_or(WsError::NotConnected { state })?;

        let raw = payload.encode()?;
        transport
            .inner
            .write(&raw)
            .map_err(|e| Error::with_source(Kind::Send, e))?;

        self.record(Message::sent(payload, raw));
        Ok(())
    }

    fn fail_send(&mut self, error: &Error) {
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %error, "Failed to send WebSocket message");

        self.last_error = Some(error.to_string());
    }

    /// Replace the error description shown by [`last_error`](Self::last_error).
    ///
    /// The connection state is left as is.
    pub fn set_last_error<S: Into<String>>(&mut self, error: S) {
        self.last_error = Some(error.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Empty the message history.
    pub fn clear_messages(&mut self) {
        self.log.clear();
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.state().is_connecting()
    }

    #[must_use]
    pub fn is_reconnecting(&self) -> bool {
        self.state().is_reconnecting()
    }

    /// Ordered copy of the message history, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.log.snapshot()
    }

    /// Description of the most recent connection or send failure.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Address of the current (or most recent) session.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.session.as_ref().map(EventDispatcher::address)
    }

    /// Readiness of the current transport; [`ReadyState::Closed`] when there is none.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.transport
            .as_ref()
            .map_or(ReadyState::Closed, |transport| transport.inner.ready_state())
    }

    /// Reconnect attempts made since the last successful open.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect.attempts()
    }

    #[must_use]
    pub fn max_reconnect_attempts(&self) -> u32 {
        self.session.as_ref().map_or_else(
            || ReconnectConfig::default().max_attempts,
            |session| session.config().reconnect.max_attempts,
        )
    }

    /// Delay of the reconnect currently waiting to fire.
    #[must_use]
    pub fn pending_reconnect_delay(&self) -> Option<Duration> {
        self.reconnect.pending().map(|pending| pending.delay)
    }

    /// Subscribe to every message appended to the history.
    ///
    /// Each call returns a new independent receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.broadcast_tx.subscribe()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Wait for the next transport event or the pending reconnect, and handle it.
    pub async fn process_next(&mut self) {
        let wake = tokio::select! {
            biased;
            Some(event) = self.events_rx.recv() => Wake::Event(event),
            () = self.reconnect.due() => Wake::Reconnect,
        };

        match wake {
            Wake::Event(event) => {
                self.dispatch(event);
            }
            Wake::Reconnect => {
                if let Some(pending) = self.reconnect.take_due() {
                    self.fire(pending);
                }
            }
        }
    }

    /// Handle every queued event and a due reconnect without waiting.
    ///
    /// Returns how many were applied. Events from superseded transports are drained but
    /// not counted.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.dispatch(event) {
                handled += 1;
            }
        }
        if let Some(pending) = self.reconnect.take_due() {
            self.fire(pending);
            handled += 1;
        }
        handled
    }

    fn fire(&mut self, pending: PendingReconnect) {
        #[cfg(feature = "tracing")]
        tracing::info!(
            address = %pending.session.address(),
            attempt = self.reconnect.attempts(),
            "Reconnecting WebSocket"
        );

        self.open(pending.session);
    }

    fn open(&mut self, session: EventDispatcher) {
        if let Some(mut previous) = self.transport.take() {
            previous.inner.close(CloseCode::NORMAL, "");
        }
        self.reconnect.cancel();
        self.generation = self.generation.wrapping_add(1);
        self.last_error = None;
        self.session = Some(session.clone());
        self.set_state(ConnectionState::Connecting);

        if session.address().is_empty() {
            self.handle_error(Error::validation("address must not be empty"));
            return;
        }

        let id = HandleId::new(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        let events = EventSink::new(id, self.events_tx.clone());

        match self.connector.open(session.address(), events) {
            Ok(inner) => self.transport = Some(ActiveTransport { id, inner }),
            Err(e) => self.handle_error(e),
        }
    }

    /// Apply `event` if it belongs to the current transport.
    fn dispatch(&mut self, event: Event) -> bool {
        if self
            .transport
            .as_ref()
            .is_none_or(|transport| transport.id != event.handle)
        {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                handle = event.handle.get(),
                "Ignoring event from superseded transport"
            );
            return false;
        }

        match event.kind {
            TransportEvent::Open => self.handle_open(),
            TransportEvent::Message(text) => self.handle_message(text),
            TransportEvent::Close(frame) => self.handle_close(frame),
            TransportEvent::Error(error) => self.handle_error(error),
        }
        true
    }

    fn handle_open(&mut self) {
        self.set_state(ConnectionState::Connected);
        self.reconnect.reset();
        self.last_error = None;

        let Some(session) = self.session.clone() else {
            return;
        };

        #[cfg(feature = "tracing")]
        tracing::info!(address = %session.address(), "WebSocket connected");

        session.open(self);
    }

    fn handle_message(&mut self, text: String) {
        #[cfg(feature = "tracing")]
        tracing::trace!(%text, "Received WebSocket text message");

        let message = Message::received(text);
        self.record(message.clone());

        if let Some(session) = self.session.clone() {
            session.message(self, &message);
        }
    }

    fn handle_close(&mut self, frame: CloseFrame) {
        self.transport = None;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            code = frame.code.as_u16(),
            reason = %frame.reason,
            "WebSocket closed"
        );

        let generation = self.generation;
        let session = self.session.clone();
        if let Some(session) = &session {
            session.close(self, &frame);
        }

        // The close handler started another session or disconnected.
        if self.generation != generation {
            return;
        }

        match session {
            Some(session) if !frame.is_normal() && session.auto_reconnect() => {
                self.schedule_reconnect(&session);
            }
            _ => self.set_state(ConnectionState::Disconnected),
        }
    }

    fn handle_error(&mut self, error: Error) {
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %error, "WebSocket error");

        self.set_state(ConnectionState::Error);
        self.last_error = Some(error.to_string());

        if let Some(session) = self.session.clone() {
            session.error(self, &error);
        }
    }

    fn schedule_reconnect(&mut self, session: &EventDispatcher) {
        match self.reconnect.schedule(session) {
            Schedule::Scheduled { attempt, delay } => {
                #[cfg(feature = "tracing")]
                tracing::info!(
                    "Reconnecting in {delay:?} (attempt {attempt}/{})",
                    session.config().reconnect.max_attempts
                );
                #[cfg(not(feature = "tracing"))]
                let _ = (&attempt, &delay);

                self.set_state(ConnectionState::Reconnecting);
            }
            Schedule::Exhausted { attempts } => {
                let error: Error = WsError::ReconnectExhausted { attempts }.into();

                #[cfg(feature = "tracing")]
                tracing::warn!(error = %error, "Giving up on WebSocket reconnection");

                self.last_error = Some(error.to_string());
                self.set_state(ConnectionState::Error);
            }
        }
    }

    fn record(&mut self, message: Message) {
        self.log.append(message.clone());
        // No subscribers is fine, the history still has it.
        _ = self.broadcast_tx.send(message);
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("address", &self.address())
            .field("handle", &self.transport.as_ref().map(|t| t.id))
            .field("reconnect_attempts", &self.reconnect.attempts())
            .field("messages", &self.log.len())
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

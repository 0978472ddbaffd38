#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests"
)]
#![allow(
    unused,
    reason = "Not every test binary uses every helper"
)]

use std::sync::{Arc, Mutex};

use realtime_socket::Result;
use realtime_socket::error::{Error, Kind};
use realtime_socket::ws::{
    CloseCode, CloseFrame, Connector, EventSink, ReadyState, Transport, WsError,
};

/// Address the mock connector refuses to open.
pub const REFUSED: &str = "mock://refused";

#[derive(Debug, Default)]
pub struct MockState {
    pub ready: ReadyState,
    pub written: Vec<String>,
    pub closed_with: Option<(CloseCode, String)>,
    pub fail_writes: bool,
}

/// One transport opened by [`MockConnector`], scripted from the test.
#[derive(Debug, Clone)]
pub struct MockHandle {
    pub address: String,
    pub events: EventSink,
    pub state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    pub fn open(&self) {
        self.state.lock().unwrap().ready = ReadyState::Open;
        self.events.open();
    }

    pub fn receive(&self, text: &str) {
        self.events.message(text);
    }

    pub fn close(&self, code: u16) {
        self.state.lock().unwrap().ready = ReadyState::Closed;
        self.events
            .close(CloseFrame::new(CloseCode::new(code), "mock close"));
    }

    pub fn error(&self, reason: &str) {
        self.events
            .error(WsError::Transport(reason.to_owned()).into());
    }

    pub fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }

    pub fn written(&self) -> Vec<String> {
        self.state.lock().unwrap().written.clone()
    }

    pub fn closed_with(&self) -> Option<(CloseCode, String)> {
        self.state.lock().unwrap().closed_with.clone()
    }

    /// The manager has released this handle (closed or replaced it).
    pub fn is_released(&self) -> bool {
        self.closed_with().is_some() || self.state.lock().unwrap().ready == ReadyState::Closed
    }
}

#[derive(Debug)]
struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl Transport for MockTransport {
    fn write(&mut self, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(WsError::Transport("write refused".to_owned()).into());
        }
        state.written.push(text.to_owned());
        Ok(())
    }

    fn ready_state(&self) -> ReadyState {
        self.state.lock().unwrap().ready
    }

    fn close(&mut self, code: CloseCode, reason: &str) {
        let mut state = self.state.lock().unwrap();
        state.ready = ReadyState::Closing;
        state.closed_with = Some((code, reason.to_owned()));
    }
}

/// Records every `open` call; the test drives the returned transports by hand.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    opened: Arc<Mutex<Vec<MockHandle>>>,
}

impl MockConnector {
    pub fn opens(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn last(&self) -> MockHandle {
        self.opened.lock().unwrap().last().cloned().unwrap()
    }

    pub fn nth(&self, n: usize) -> MockHandle {
        self.opened.lock().unwrap()[n].clone()
    }

    /// Handles the manager has not released yet.
    pub fn live(&self) -> usize {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .filter(|handle| !handle.is_released())
            .count()
    }
}

impl Connector for MockConnector {
    fn open(&self, address: &str, events: EventSink) -> Result<Box<dyn Transport>> {
        if address == REFUSED {
            return Err(Error::with_source(
                Kind::Connection,
                WsError::Transport("connection refused".to_owned()),
            ));
        }

        let state = Arc::new(Mutex::new(MockState::default()));
        self.opened.lock().unwrap().push(MockHandle {
            address: address.to_owned(),
            events,
            state: Arc::clone(&state),
        });

        Ok(Box::new(MockTransport { state }))
    }
}

#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;

use super::connection::ConnectionState;
use crate::error::{Error, Kind};

/// WebSocket error variants.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// Error connecting to or communicating with the WebSocket server
    #[cfg(feature = "tungstenite")]
    Connection(tokio_tungstenite::tungstenite::Error),
    /// The transport reported a failure described only by text
    Transport(String),
    /// WebSocket connection was closed
    ConnectionClosed,
    /// A message was sent while the manager was not connected
    NotConnected {
        /// State the manager was in when the send was attempted
        state: ConnectionState,
    },
    /// Reconnection gave up
    ReconnectExhausted {
        /// Number of attempts that were made
        attempts: u32,
    },
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "tungstenite")]
            Self::Connection(e) => write!(f, "WebSocket connection error: {e}"),
            Self::Transport(reason) => write!(f, "WebSocket transport error: {reason}"),
            Self::ConnectionClosed => write!(f, "WebSocket connection closed"),
            Self::NotConnected { state } => write!(f, "WebSocket is not connected ({state:?})"),
            Self::ReconnectExhausted { attempts } => {
                write!(f, "max reconnection attempts reached ({attempts})")
            }
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            #[cfg(feature = "tungstenite")]
            Self::Connection(e) => Some(e),
            _ => None,
        }
    }
}

impl WsError {
    /// The crate-level [`Kind`] this error is reported under.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::NotConnected { .. } => Kind::Send,
            Self::ReconnectExhausted { .. } => Kind::ReconnectExhausted,
            _ => Kind::Connection,
        }
    }
}

// Integration with main Error type
impl From<WsError> for Error {
    fn from(e: WsError) -> Self {
        Error::with_source(e.kind(), e)
    }
}

#[cfg(feature = "tungstenite")]
impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::with_source(Kind::Connection, WsError::Connection(e))
    }
}

//! Resilient WebSocket connection management.
//!
//! The [`ConnectionManager`] owns at most one live transport, reconnects it with
//! exponential backoff after an abnormal close and keeps a bounded history of the
//! messages exchanged over it.
//!
//! # Architecture
//!
//! - [`ConnectionManager`]: state machine and public control surface
//! - `ReconnectPolicy`: backoff delay, attempt cap, pending timer
//! - [`MessageLog`](log::MessageLog): bounded FIFO of sent and received messages
//! - [`SessionConfig`](config::SessionConfig): callbacks and reconnect settings for one session
//! - [`Connector`] / [`Transport`]: the seam to the underlying socket
//!
//! Transports push events onto the manager's queue. The host drives the manager by
//! awaiting [`ConnectionManager::process_next`] in its event loop.
//!
//! # Example
//!
//! ```ignore
//! let mut manager = ConnectionManager::new(TungsteniteConnector::default());
//! manager.connect("wss://example.com/ws", SessionConfig::default().with_auto_reconnect(true));
//!
//! loop {
//!     manager.process_next().await;
//!     if manager.is_connected() {
//!         manager.send(json!({ "type": "ping" }));
//!     }
//! }
//! ```

pub mod config;
pub mod connection;
mod dispatcher;
pub mod error;
pub mod event;
pub mod log;
mod reconnect;
pub mod traits;
#[cfg(feature = "tungstenite")]
pub mod tungstenite;

pub use config::{ReconnectConfig, SessionConfig};
pub use connection::{ConnectionManager, ConnectionState};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use event::{CloseCode, CloseFrame, EventSink, HandleId};
pub use log::{Direction, Message, MessageLog, Payload};
pub use traits::*;
#[cfg(feature = "tungstenite")]
pub use tungstenite::TungsteniteConnector;

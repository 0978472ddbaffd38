//! Connects to an echo server, sends a few messages and prints what comes back.
//!
//! Run with tracing enabled:
//! ```sh
//! RUST_LOG=info cargo run --example echo --features tungstenite,tracing -- wss://echo.websocket.org
//! ```

use std::time::Duration;

use realtime_socket::ws::{ConnectionManager, ConnectionState, SessionConfig, TungsteniteConnector};
use serde_json::json;
use tokio::time::timeout;
use tracing::{info, warn};

const DEFAULT_ADDRESS: &str = "wss://echo.websocket.org";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let address = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ECHO_ADDRESS").ok())
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_owned());

    let config = SessionConfig::default()
        .with_auto_reconnect(true)
        .on_open(|manager| {
            info!(address = ?manager.address(), "Connected");
            manager.send(json!({ "type": "hello", "n": 1 }));
            manager.send("plain text");
        })
        .on_message(|_, message| {
            info!(payload = ?message.payload, raw = ?message.raw, "Received");
        })
        .on_close(|_, frame| {
            info!(code = frame.code.as_u16(), reason = %frame.reason, "Closed");
        })
        .on_error(|_, error| warn!(%error, "Connection error"));

    let mut manager = ConnectionManager::new(TungsteniteConnector::default());
    let mut states = manager.state_receiver();
    manager.connect(address, config);

    // Drive the manager for a few seconds, then shut down.
    let finished = timeout(Duration::from_secs(5), async {
        loop {
            manager.process_next().await;
            if states.has_changed().unwrap_or(false) {
                let state = *states.borrow_and_update();
                info!(?state, "State changed");
                if state == ConnectionState::Disconnected {
                    break;
                }
            }
        }
    })
    .await;
    if finished.is_err() {
        info!("Time is up, closing");
    }

    manager.disconnect();
    info!(logged = manager.messages().len(), "Done");

    Ok(())
}

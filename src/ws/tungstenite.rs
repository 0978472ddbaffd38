//! [`Connector`] backed by `tokio-tungstenite`.

use futures::{SinkExt as _, StreamExt as _};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as WireCloseFrame;
use url::Url;

use super::error::WsError;
use super::event::{CloseCode, CloseFrame, EventSink};
use super::traits::{Connector, ReadyState, Transport};
use crate::Result;
use crate::error::Error;

/// Opens `ws://` and `wss://` connections on the current Tokio runtime.
///
/// Each transport runs in its own task. A failed handshake is reported as an error
/// followed by an abnormal close, so auto-reconnect also covers failed establishment.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl Connector for TungsteniteConnector {
    fn open(&self, address: &str, events: EventSink) -> Result<Box<dyn Transport>> {
        let url = Url::parse(address)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::validation(format!(
                "unsupported WebSocket scheme `{}`",
                url.scheme()
            )));
        }

        let runtime = Handle::try_current()
            .map_err(|e| WsError::Transport(format!("no Tokio runtime available: {e}")))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = watch::channel(ReadyState::Connecting);

        runtime.spawn(async move {
            run(url, events, command_rx, ready_tx).await;
        });

        Ok(Box::new(TungsteniteTransport {
            command_tx,
            ready_rx,
        }))
    }
}

#[derive(Debug)]
enum Command {
    Text(String),
    Close(CloseFrame),
}

/// Handle to a connection task. Dropping it closes the connection.
#[derive(Debug)]
struct TungsteniteTransport {
    command_tx: mpsc::UnboundedSender<Command>,
    ready_rx: watch::Receiver<ReadyState>,
}

impl Transport for TungsteniteTransport {
    fn write(&mut self, text: &str) -> Result<()> {
        if !self.ready_state().is_open() {
            return Err(WsError::ConnectionClosed.into());
        }
        self.command_tx
            .send(Command::Text(text.to_owned()))
            .map_err(|_e| WsError::ConnectionClosed)?;
        Ok(())
    }

    fn ready_state(&self) -> ReadyState {
        *self.ready_rx.borrow()
    }

    fn close(&mut self, code: CloseCode, reason: &str) {
        // The task is already gone when the channel is closed.
        _ = self
            .command_tx
            .send(Command::Close(CloseFrame::new(code, reason)));
    }
}

/// Connection task: handshake, then pump frames until either side closes.
async fn run(
    url: Url,
    events: EventSink,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    ready_tx: watch::Sender<ReadyState>,
) {
    let ws_stream = match connect_async(url.as_str()).await {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(%url, error = %e, "Unable to connect");

            ready_tx.send_replace(ReadyState::Closed);
            events.error(e.into());
            events.close(CloseFrame::abnormal());
            return;
        }
    };

    ready_tx.send_replace(ReadyState::Open);
    events.open();

    let (mut write, mut read) = ws_stream.split();

    let frame = loop {
        tokio::select! {
            // Handle incoming messages
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => events.message(text.as_str()),
                    Some(Ok(Message::Close(frame))) => {
                        break frame.map_or_else(
                            || CloseFrame::new(CloseCode::NO_STATUS, ""),
                            |frame| CloseFrame::new(
                                CloseCode::new(frame.code.into()),
                                frame.reason.as_str(),
                            ),
                        );
                    }
                    Some(Ok(_)) => {
                        // Ignore binary frames; PING/PONG are answered by tungstenite.
                    }
                    Some(Err(e)) => {
                        events.error(e.into());
                        break CloseFrame::abnormal();
                    }
                    None => break CloseFrame::abnormal(),
                }
            }

            // Handle outgoing messages and close requests
            command = command_rx.recv() => {
                match command {
                    Some(Command::Text(text)) => {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(%text, "Sending WebSocket text message");

                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            events.error(e.into());
                            break CloseFrame::abnormal();
                        }
                    }
                    Some(Command::Close(frame)) => {
                        ready_tx.send_replace(ReadyState::Closing);
                        let wire = WireCloseFrame {
                            code: frame.code.as_u16().into(),
                            reason: frame.reason.clone().into(),
                        };
                        _ = write.send(Message::Close(Some(wire))).await;
                        break frame;
                    }
                    // Handle dropped
                    None => {
                        _ = write.close().await;
                        break CloseFrame::normal();
                    }
                }
            }
        }
    };

    ready_tx.send_replace(ReadyState::Closed);
    events.close(frame);
}

//! WebSocket-backed [`Transport`].
//!
//! The write half of the WebSocket lives in its own task fed by an unbounded
//! channel.  [`WsTransport::send_text`] never blocks the driver, and frames
//! leave in exactly the order they were queued.

use std::fmt::Display;

use futures_util::{Sink, SinkExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};

pub use crate::application::session::{Transport, TransportError};

/// Sending side of a WebSocket connection.
#[derive(Debug)]
pub struct WsTransport {
    tx: mpsc::UnboundedSender<WsMessage>,
    closing: bool,
}

impl WsTransport {
    /// Spawns the writer task over `sink` and returns the transport handle
    /// together with the task.
    ///
    /// The task ends after writing a close frame, when the sink fails, or when
    /// the transport is dropped.
    pub fn spawn<S>(sink: S, session_id: String) -> (Self, JoinHandle<()>)
    where
        S: Sink<WsMessage> + Unpin + Send + 'static,
        S::Error: Display,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_loop(sink, rx, session_id));
        (Self { tx, closing: false }, writer)
    }
}

impl Transport for WsTransport {
    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.closing {
            return Err(TransportError::Closed);
        }
        self.tx
            .send(WsMessage::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        if self.closing {
            return;
        }
        self.closing = true;
        // If the writer already exited there is nobody left to tell.
        let _ = self.tx.send(WsMessage::Close(None));
    }

    fn is_open(&self) -> bool {
        !self.closing && !self.tx.is_closed()
    }
}

async fn write_loop<S>(mut sink: S, mut rx: mpsc::UnboundedReceiver<WsMessage>, session_id: String)
where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    while let Some(msg) = rx.recv().await {
        let is_close = matches!(msg, WsMessage::Close(_));
        if let Err(e) = sink.send(msg).await {
            if is_close {
                // The peer may have closed first.
                debug!("session {session_id}: close frame not sent: {e}");
            } else {
                warn!("session {session_id}: WebSocket write failed: {e}");
            }
            return;
        }
        if is_close {
            debug!("session {session_id}: close frame sent");
            return;
        }
    }
    // Transport dropped without an explicit close.
    let _ = sink.close().await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────

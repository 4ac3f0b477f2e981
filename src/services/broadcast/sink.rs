use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, stream::SplitSink};
use tokio::{sync::Mutex, time};
use tracing::debug;

use super::TransportError;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Write half of one subscriber's transport.
///
/// A connection never issues two writes at once, so implementations do not
/// need to handle concurrent `write` calls. A `write` may be dropped before
/// it completes when the connection closes; `close` follows such a drop.
#[async_trait]
pub trait MessageSink: Send + Sync + 'static {
    /// Transmit one text message.
    ///
    /// # Errors
    /// Returns error if the peer is gone or the transport failed.
    async fn write(&self, message: String) -> Result<(), TransportError>;

    /// Ask the transport to shut down. Failures are ignored.
    async fn close(&self);
}

/// [`MessageSink`] over the write half of an axum websocket.
///
/// The write half sits behind an async lock that only a pending `write`
/// holds. Closing the connection drops that write, so `close` gets the
/// lock; the close handshake itself is bounded in time.
pub struct WebSocketSink {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WebSocketSink {
    /// Wrap the write half of a split websocket.
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

#[async_trait]
impl MessageSink for WebSocketSink {
    async fn write(&self, message: String) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .send(Message::Text(message.into()))
            .await
            .map_err(|e| TransportError::WriteFailed(e.to_string()))
    }

    async fn close(&self) {
        let handshake = async {
            let mut sink = self.sink.lock().await;
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        };

        if time::timeout(CLOSE_TIMEOUT, handshake).await.is_err() {
            debug!("Websocket close handshake timed out");
        }
    }
}

//! Websocket endpoint feeding the broadcast hub.
//!
//! Every path accepts a websocket upgrade. Each socket is split: the write
//! half becomes a [`WebSocketSink`] registered with the hub, the read half
//! is drained until the peer closes or the hub closes the connection.

use std::{
    io,
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::StreamExt;
use tokio::{net::TcpListener, sync::watch, task::JoinHandle, time};
use tracing::{debug, error, info, instrument, warn};

use super::{BroadcastHub, TransportError, WebSocketSink};

const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Websocket server bound to one address, publishing through a hub.
pub struct BroadcastServer {
    hub: BroadcastHub,
    local_addr: SocketAddr,
    listener: Mutex<Option<TcpListener>>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<io::Result<()>>>>,
}

impl BroadcastServer {
    /// Bind the listening endpoint.
    ///
    /// # Errors
    /// Returns `TransportError::Bind` if the address is invalid or in use.
    #[instrument(skip(hub))]
    pub async fn bind(address: &str, hub: BroadcastHub) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| TransportError::Bind {
                address: address.to_string(),
                details: e.to_string(),
            })?;

        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            address: address.to_string(),
            details: e.to_string(),
        })?;

        let (shutdown_tx, _) = watch::channel(false);

        info!(%local_addr, "Broadcast server bound");
        Ok(Self {
            hub,
            local_addr,
            listener: Mutex::new(Some(listener)),
            shutdown_tx,
            task: Mutex::new(None),
        })
    }

    /// Address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Hub the server registers its subscribers with.
    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Start serving connections in the background.
    ///
    /// # Errors
    /// Returns `TransportError::ServerTask` when called twice.
    pub fn start(&self) -> Result<(), TransportError> {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| TransportError::ServerTask("server already started".to_string()))?;

        let app = Router::new()
            .fallback(handle_upgrade)
            .with_state(self.hub.clone());

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.wait_for(|stop| *stop).await;
                })
                .await
        });

        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        info!(address = %self.local_addr, "Broadcast server listening");
        Ok(())
    }

    /// Stop admitting connections, close every subscriber and wait for the
    /// server task and all connection tasks to finish.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        self.hub.stop_accepting();
        self.shutdown_tx.send_replace(true);
        self.hub.close_all();

        if time::timeout(STOP_TIMEOUT, self.hub.wait_idle())
            .await
            .is_err()
        {
            warn!("Subscriber tasks did not finish in time");
        }

        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut task) = task else {
            return;
        };

        match time::timeout(STOP_TIMEOUT, &mut task).await {
            Ok(Ok(Ok(()))) => info!("Broadcast server stopped"),
            Ok(Ok(Err(e))) => error!("Broadcast server failed: {e}"),
            Ok(Err(e)) => error!("Broadcast server task panicked: {e}"),
            Err(_) => {
                warn!("Broadcast server did not drain in time, aborting");
                task.abort();
            }
        }
    }
}

async fn handle_upgrade(ws: WebSocketUpgrade, State(hub): State<BroadcastHub>) -> Response {
    let tasks = hub.tasks().clone();
    ws.on_upgrade(move |socket| tasks.track_future(serve_socket(socket, hub)))
}

async fn serve_socket(socket: WebSocket, hub: BroadcastHub) {
    let (sink, mut stream) = socket.split();

    let connection = match hub.accept(Arc::new(WebSocketSink::new(sink))) {
        Ok(connection) => connection,
        Err(e) => {
            debug!("Rejected subscriber: {e}");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = connection.closed() => break,
            message = stream.next() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(connection = %connection.id(), "Read failed: {e}");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    hub.remove(connection.id());
}

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument};

use super::{ConnectionId, MessageSink, SubscriberConnection, TransportError};

/// Called after a connection joins, with the new live count.
pub type ConnectObserver = Arc<dyn Fn(&Arc<SubscriberConnection>, usize) + Send + Sync>;

/// Called after a connection leaves, with the new live count.
pub type DisconnectObserver = Arc<dyn Fn(usize) + Send + Sync>;

/// Live set of subscriber connections and fan-out point for messages.
///
/// Cloning yields another handle to the same hub. Observers run after the
/// connection set lock is released, so they may call back into the hub.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    next_id: AtomicU64,
    connections: Mutex<HashMap<ConnectionId, Arc<SubscriberConnection>>>,
    accepting: AtomicBool,
    tasks: TaskTracker,
    on_connect: RwLock<Option<ConnectObserver>>,
    on_disconnect: RwLock<Option<DisconnectObserver>>,
}

impl BroadcastHub {
    /// Create an empty hub that accepts connections.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                next_id: AtomicU64::new(1),
                connections: Mutex::new(HashMap::new()),
                accepting: AtomicBool::new(true),
                tasks: TaskTracker::new(),
                on_connect: RwLock::new(None),
                on_disconnect: RwLock::new(None),
            }),
        }
    }

    /// Set the observer run for every accepted connection.
    pub fn on_connect<F>(&self, observer: F)
    where
        F: Fn(&Arc<SubscriberConnection>, usize) + Send + Sync + 'static,
    {
        *self
            .inner
            .on_connect
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(observer));
    }

    /// Set the observer run for every removed connection.
    pub fn on_disconnect<F>(&self, observer: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        *self
            .inner
            .on_disconnect
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(observer));
    }

    /// Register a new subscriber writing to `sink`.
    ///
    /// The connection removes itself from the hub when it closes.
    ///
    /// # Errors
    /// Returns `TransportError::Closed` once the hub stopped accepting.
    pub fn accept(
        &self,
        sink: Arc<dyn MessageSink>,
    ) -> Result<Arc<SubscriberConnection>, TransportError> {
        if !self.is_accepting() {
            return Err(TransportError::Closed);
        }

        let id = ConnectionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let hub = Arc::downgrade(&self.inner);
        let connection = SubscriberConnection::with_close_callback(
            id,
            sink,
            self.inner.tasks.clone(),
            move |id| {
                if let Some(inner) = Weak::upgrade(&hub) {
                    inner.remove(id);
                }
            },
        );

        let count = self.register(Arc::clone(&connection));

        info!(connection = %id, subscribers = count, "Subscriber connected");

        let observer = self
            .inner
            .on_connect
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(observer) = observer {
            observer(&connection, count);
        }

        Ok(connection)
    }

    /// Add `connection` to the live set and return the new count.
    pub(super) fn register(&self, connection: Arc<SubscriberConnection>) -> usize {
        let mut connections = self.inner.lock_connections();
        connections.insert(connection.id(), connection);
        connections.len()
    }

    /// Queue `message` on every open connection and prune closed ones.
    ///
    /// Never waits for a write. Returns how many connections it was queued on.
    pub fn broadcast(&self, message: &str) -> usize {
        let mut delivered = 0;
        let mut pruned = 0;

        self.inner.lock_connections().retain(|_, connection| {
            if connection.is_open() {
                connection.send(message.to_string());
                delivered += 1;
                true
            } else {
                pruned += 1;
                false
            }
        });

        if pruned > 0 {
            debug!(pruned, "Pruned closed subscribers");
        }

        delivered
    }

    /// Remove and close a connection. Returns whether it was registered.
    pub fn remove(&self, id: ConnectionId) -> bool {
        self.inner.remove(id)
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.inner.lock_connections().len()
    }

    /// Whether new connections are admitted.
    pub fn is_accepting(&self) -> bool {
        self.inner.accepting.load(Ordering::SeqCst)
    }

    /// Refuse every future `accept`.
    pub fn stop_accepting(&self) {
        self.inner.accepting.store(false, Ordering::SeqCst);
    }

    /// Stop accepting, then close every registered connection.
    #[instrument(skip(self))]
    pub fn close_all(&self) {
        self.stop_accepting();

        let drained: Vec<_> = self
            .inner
            .lock_connections()
            .drain()
            .map(|(_, connection)| connection)
            .collect();

        if drained.is_empty() {
            return;
        }

        info!(subscribers = drained.len(), "Closing all subscribers");
        for connection in &drained {
            connection.close();
        }

        self.inner.notify_disconnect(0);
    }

    /// Tracker for every task doing I/O on behalf of this hub's connections.
    pub(crate) fn tasks(&self) -> &TaskTracker {
        &self.inner.tasks
    }

    /// Wait until every writer and transport task spawned for this hub has
    /// finished. Call after [`close_all`](Self::close_all).
    pub async fn wait_idle(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl HubInner {
    fn lock_connections(&self) -> MutexGuard<'_, HashMap<ConnectionId, Arc<SubscriberConnection>>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: ConnectionId) -> bool {
        let (connection, count) = {
            let mut connections = self.lock_connections();
            let connection = connections.remove(&id);
            (connection, connections.len())
        };

        let Some(connection) = connection else {
            return false;
        };

        connection.close();
        info!(connection = %id, subscribers = count, "Subscriber disconnected");
        self.notify_disconnect(count);
        true
    }

    fn notify_disconnect(&self, count: usize) {
        let observer = self
            .on_disconnect
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(observer) = observer {
            observer(count);
        }
    }
}

use std::{
    collections::VecDeque,
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::{runtime::Handle, sync::watch};
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use super::MessageSink;

/// Opaque handle naming one subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type CloseCallback = Box<dyn FnOnce(ConnectionId) + Send>;

#[derive(Default)]
struct Outbound {
    queue: VecDeque<String>,
    writing: bool,
}

/// One subscriber with its own FIFO of outbound messages.
///
/// At most one write is in flight per connection. `send` only enqueues; a
/// writer task drains the queue and exits when it runs dry, to be restarted
/// by the next `send`. The first write failure closes the connection, and
/// closing cancels a write still in flight.
pub struct SubscriberConnection {
    id: ConnectionId,
    sink: Arc<dyn MessageSink>,
    runtime: Handle,
    tasks: TaskTracker,
    open: AtomicBool,
    outbound: Mutex<Outbound>,
    on_close: Mutex<Option<CloseCallback>>,
    closed_tx: watch::Sender<bool>,
}

impl SubscriberConnection {
    /// Create an open connection writing to `sink`.
    ///
    /// Must be called from within a tokio runtime; writer tasks are spawned
    /// on that runtime even when `send` is called from another thread.
    pub fn new(id: ConnectionId, sink: Arc<dyn MessageSink>) -> Arc<Self> {
        Self::tracked(id, sink, TaskTracker::new())
    }

    fn tracked(id: ConnectionId, sink: Arc<dyn MessageSink>, tasks: TaskTracker) -> Arc<Self> {
        let (closed_tx, _) = watch::channel(false);

        Arc::new(Self {
            id,
            sink,
            runtime: Handle::current(),
            tasks,
            open: AtomicBool::new(true),
            outbound: Mutex::new(Outbound::default()),
            on_close: Mutex::new(None),
            closed_tx,
        })
    }

    /// Connection whose writer tasks are spawned on `tasks`, calling
    /// `on_close` once when it closes.
    pub(crate) fn with_close_callback<F>(
        id: ConnectionId,
        sink: Arc<dyn MessageSink>,
        tasks: TaskTracker,
        on_close: F,
    ) -> Arc<Self>
    where
        F: FnOnce(ConnectionId) + Send + 'static,
    {
        let connection = Self::tracked(id, sink, tasks);
        *lock(&connection.on_close) = Some(Box::new(on_close));
        connection
    }

    /// Handle of this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether the connection still accepts messages.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Messages waiting behind the current write.
    pub fn pending(&self) -> usize {
        lock(&self.outbound).queue.len()
    }

    /// Queue `message` for delivery. A no-op once the connection is closed.
    pub fn send(self: &Arc<Self>, message: String) {
        if !self.is_open() {
            return;
        }

        let start_writer = {
            let mut outbound = lock(&self.outbound);
            outbound.queue.push_back(message);
            !std::mem::replace(&mut outbound.writing, true)
        };

        if start_writer {
            self.tasks
                .spawn_on(Arc::clone(self).drain(), &self.runtime);
        }
    }

    /// Request transport shutdown. Pending messages are discarded and a
    /// write in flight is abandoned.
    ///
    /// Idempotent; the close callback still fires exactly once.
    pub fn close(&self) {
        if self.mark_closed() {
            let sink = Arc::clone(&self.sink);
            self.tasks
                .spawn_on(async move { sink.close().await }, &self.runtime);
        }
    }

    /// Whether a writer task currently owns the queue.
    pub fn is_writing(&self) -> bool {
        lock(&self.outbound).writing
    }

    /// Resolves once the connection is closed.
    pub async fn closed(&self) {
        let mut closed_rx = self.closed_tx.subscribe();
        let _ = closed_rx.wait_for(|closed| *closed).await;
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let message = {
                let mut outbound = lock(&self.outbound);
                match outbound.queue.pop_front() {
                    Some(message) if self.is_open() => message,
                    _ => {
                        outbound.queue.clear();
                        outbound.writing = false;
                        return;
                    }
                }
            };

            let result = tokio::select! {
                result = self.sink.write(message) => result,
                () = self.closed() => {
                    debug!(connection = %self.id, "Write abandoned on close");
                    lock(&self.outbound).writing = false;
                    return;
                }
            };

            if let Err(e) = result {
                warn!(connection = %self.id, "Write failed, dropping subscriber: {e}");
                self.mark_closed();
                lock(&self.outbound).writing = false;
                return;
            }
        }
    }

    fn mark_closed(&self) -> bool {
        if !self.open.swap(false, Ordering::SeqCst) {
            return false;
        }

        lock(&self.outbound).queue.clear();
        self.closed_tx.send_replace(true);
        debug!(connection = %self.id, "Connection closed");

        let callback = lock(&self.on_close).take();
        if let Some(callback) = callback {
            callback(self.id);
        }

        true
    }
}

impl fmt::Debug for SubscriberConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberConnection")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

use std::sync::{
    Arc, Mutex, PoisonError, Weak,
    atomic::{AtomicU64, Ordering},
};

use super::{EventKind, TrackSnapshot};

/// Callback invoked with the snapshot that triggered an event.
///
/// Runs synchronously on the tracker's update path, so it must return
/// quickly, must not block on I/O and must not call `tick` or `refresh`
/// on the same tracker.
pub type Listener = Arc<dyn Fn(&TrackSnapshot) + Send + Sync>;

struct ListenerEntry {
    id: u64,
    kind: EventKind,
    listener: Listener,
}

/// Listeners registered on a tracker, kept in insertion order.
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<ListenerEntry>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn add(self: &Arc<Self>, kind: EventKind, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ListenerEntry { id, kind, listener });

        Subscription {
            id,
            kind,
            registry: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|entry| entry.id == id)
    }

    /// Listeners for `kind`, cloned out so none of them runs under the registry lock.
    pub(crate) fn listeners_for(&self, kind: EventKind) -> Vec<Listener> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| Arc::clone(&entry.listener))
            .collect()
    }

    pub(crate) fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Handle for one registered listener.
///
/// The listener stays registered until the handle is cancelled or dropped,
/// or until the tracker is stopped.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    id: u64,
    kind: EventKind,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    /// Event kind this subscription listens to.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }

    /// Unregister the listener. Returns whether it was still registered.
    pub fn cancel(self) -> bool {
        self.release()
    }

    fn release(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

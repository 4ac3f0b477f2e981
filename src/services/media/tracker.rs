use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, SystemTime},
};

use futures::StreamExt;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, instrument, trace, warn};

use super::{
    EventKind, MediaError, MediaProvider, ProviderNotification, RawSession, Subscription,
    TrackSnapshot,
    clock::{Clock, SystemClock, extrapolate_position},
    identity::IdentityMemo,
    subscription::ListenerRegistry,
};
use crate::config::MediaConfig;

const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Owns the live snapshot, decides which events fire and runs the
/// position tick.
///
/// Cloning yields another handle to the same tracker.
#[derive(Clone)]
pub struct SessionTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    provider: Arc<dyn MediaProvider>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    /// Serializes notification handling, ticks and shutdown, listener dispatch included.
    update_lock: Mutex<()>,
    state: Mutex<TrackerState>,
    listeners: Arc<ListenerRegistry>,
    started: AtomicBool,
    stopped: AtomicBool,
    tasks: Mutex<Option<BackgroundTasks>>,
}

struct TrackerState {
    snapshot: TrackSnapshot,
    /// Position at `anchor_at`; ticks extrapolate from here.
    anchor_position: Duration,
    anchor_at: SystemTime,
    memo: IdentityMemo,
}

struct BackgroundTasks {
    stop_tx: watch::Sender<bool>,
    notifications: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionTracker {
    /// Create a tracker reading from `provider` using the system clock.
    pub fn new(provider: Arc<dyn MediaProvider>, config: &MediaConfig) -> Self {
        Self::with_clock(provider, Arc::new(SystemClock), config.tick_interval())
    }

    /// Create a tracker with an explicit clock and tick interval.
    pub fn with_clock(
        provider: Arc<dyn MediaProvider>,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
    ) -> Self {
        let now = clock.now();

        Self {
            inner: Arc::new(TrackerInner {
                provider,
                clock,
                tick_interval,
                update_lock: Mutex::new(()),
                state: Mutex::new(TrackerState {
                    snapshot: TrackSnapshot::no_media(now),
                    anchor_position: Duration::ZERO,
                    anchor_at: now,
                    memo: IdentityMemo::default(),
                }),
                listeners: ListenerRegistry::new(),
                started: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                tasks: Mutex::new(None),
            }),
        }
    }

    /// Take the initial snapshot and start following the provider.
    ///
    /// Subscribes to provider notifications before the first read so no
    /// change is lost, then starts the periodic position tick.
    ///
    /// # Errors
    /// Returns `MediaError::AlreadyStarted` on a second call and
    /// `MediaError::Stopped` after `stop()`.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), MediaError> {
        if self.inner.stopped.load(Ordering::SeqCst) {
            return Err(MediaError::Stopped);
        }

        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(MediaError::AlreadyStarted);
        }

        let notifications = self.inner.provider.notifications();

        let initial = match self.inner.provider.current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Cannot read initial session, starting without media: {e}");
                None
            }
        };
        self.inner.apply(initial.as_ref());

        let (stop_tx, stop_rx) = watch::channel(false);
        let notifications = tokio::spawn(Arc::clone(&self.inner).run_notifications(
            notifications,
            stop_rx.clone(),
        ));
        let ticker = tokio::spawn(Arc::clone(&self.inner).run_ticker(stop_rx));

        *lock(&self.inner.tasks) = Some(BackgroundTasks {
            stop_tx,
            notifications,
            ticker,
        });

        info!("Session tracker started");
        Ok(())
    }

    /// Stop following the provider and the tick, then drop every listener.
    ///
    /// Waits for the background tasks to observe the stop signal. Once this
    /// returns no listener is invoked again. Calling it twice is harmless.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        {
            let _update = lock(&self.inner.update_lock);
            if self.inner.stopped.swap(true, Ordering::SeqCst) {
                return;
            }
        }

        let tasks = lock(&self.inner.tasks).take();

        if let Some(mut tasks) = tasks {
            let _ = tasks.stop_tx.send(true);

            for (name, handle) in [
                ("notifications", &mut tasks.notifications),
                ("ticker", &mut tasks.ticker),
            ] {
                if time::timeout(STOP_TIMEOUT, &mut *handle).await.is_err() {
                    warn!(task = name, "Tracker task ignored stop signal, aborting");
                    handle.abort();
                }
            }
        }

        self.inner.listeners.clear();
        info!("Session tracker stopped");
    }

    /// Handle a provider notification: rebuild the snapshot and fire
    /// whichever identity events changed.
    pub fn on_provider_notification(&self, notification: &ProviderNotification) {
        debug!(kind = ?notification.kind, "Provider notification");
        self.inner.apply(notification.session.as_ref());
    }

    /// Rebuild the snapshot from an explicit session state.
    pub fn refresh(&self, session: Option<&RawSession>) {
        self.inner.apply(session);
    }

    /// Advance the extrapolated position once and fire `PositionChanged`
    /// when playing. The background ticker calls this on every interval.
    pub fn tick(&self) {
        self.inner.tick();
    }

    /// Register `listener` for one event kind.
    ///
    /// Listeners of the same kind run in registration order.
    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&TrackSnapshot) + Send + Sync + 'static,
    {
        self.inner.listeners.add(kind, Arc::new(listener))
    }

    /// Copy of the latest snapshot.
    pub fn current_snapshot(&self) -> TrackSnapshot {
        lock(&self.inner.state).snapshot.clone()
    }

    /// Number of registered listeners across all kinds.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Whether `start()` succeeded and `stop()` has not been called.
    pub fn is_running(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst) && !self.inner.stopped.load(Ordering::SeqCst)
    }
}

impl TrackerInner {
    fn apply(&self, session: Option<&RawSession>) {
        let _update = lock(&self.update_lock);
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }

        let now = self.clock.now();
        let snapshot = TrackSnapshot::from_optional_session(session, now);

        let changes = {
            let mut state = lock(&self.state);
            let changes = state.memo.observe(&snapshot);
            state.anchor_position = snapshot.position;
            state.anchor_at = now;
            state.snapshot = snapshot.clone();
            changes
        };

        if changes.session {
            info!(
                app = %snapshot.app_name,
                playing = snapshot.is_playing,
                has_media = snapshot.has_media,
                "Session changed"
            );
            self.dispatch(EventKind::SessionChanged, &snapshot);
        }

        if changes.track {
            info!(
                title = %snapshot.title,
                artist = %snapshot.artist,
                playing = snapshot.is_playing,
                "Track changed"
            );
            self.dispatch(EventKind::TrackChanged, &snapshot);
        }
    }

    fn tick(&self) {
        let _update = lock(&self.update_lock);
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }

        let snapshot = {
            let mut state = lock(&self.state);
            if !state.snapshot.is_playing {
                return;
            }

            let now = self.clock.now();
            let elapsed = now
                .duration_since(state.anchor_at)
                .unwrap_or(Duration::ZERO);
            let position = extrapolate_position(
                state.anchor_position,
                state.snapshot.duration,
                true,
                elapsed,
            );

            let next = TrackSnapshot {
                position,
                last_refresh: now,
                ..state.snapshot.clone()
            };
            state.snapshot = next.clone();
            next
        };

        trace!(position_secs = snapshot.position.as_secs(), "Position tick");
        self.dispatch(EventKind::PositionChanged, &snapshot);
    }

    fn dispatch(&self, kind: EventKind, snapshot: &TrackSnapshot) {
        for listener in self.listeners.listeners_for(kind) {
            listener(snapshot);
        }
    }

    async fn run_notifications(
        self: Arc<Self>,
        mut notifications: futures::stream::BoxStream<'static, ProviderNotification>,
        mut stop_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = stop_rx.changed() => break,
                notification = notifications.next() => match notification {
                    Some(notification) => {
                        debug!(kind = ?notification.kind, "Provider notification");
                        self.apply(notification.session.as_ref());
                    }
                    None => {
                        warn!("Provider notification stream ended");
                        break;
                    }
                },
            }
        }

        debug!("Provider subscription released");
    }

    async fn run_ticker(self: Arc<Self>, mut stop_rx: watch::Receiver<bool>) {
        let mut interval = time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = stop_rx.changed() => break,
                _ = interval.tick() => self.tick(),
            }
        }

        debug!("Position ticker stopped");
    }
}

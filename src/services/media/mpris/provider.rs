use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use tokio::{
    sync::{RwLock, broadcast},
    task::JoinHandle,
};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, instrument, warn};
use zbus::{Connection, fdo};

use super::{
    MPRIS_PREFIX, MediaPlayer2PlayerProxy, MediaPlayer2Proxy, TrackMetadata,
    thumbnail::load_thumbnail,
};
use crate::{
    config::MediaConfig,
    services::media::{
        MediaError, MediaProvider, NotificationKind, PlaybackStatus, ProviderNotification,
        RawSession,
    },
};

struct PlayerEntry {
    proxy: MediaPlayer2PlayerProxy<'static>,
    identity: Option<String>,
    status: PlaybackStatus,
    /// Discovery order, used to pick a fallback session.
    order: u64,
    monitor: Option<JoinHandle<()>>,
}

struct MprisState {
    players: HashMap<String, PlayerEntry>,
    active: Option<String>,
    next_order: u64,
}

struct MprisInner {
    connection: Connection,
    config: MediaConfig,
    state: RwLock<MprisState>,
    notifications_tx: broadcast::Sender<ProviderNotification>,
    discovery: Mutex<Option<JoinHandle<()>>>,
}

/// Media provider backed by MPRIS players on the D-Bus session bus.
///
/// The active session is the player that most recently started playing;
/// when it goes away the next playing player, or the oldest remaining one,
/// takes over. Players rejected by the media config are never tracked.
#[derive(Clone)]
pub struct MprisProvider {
    inner: Arc<MprisInner>,
}

/// App id of a player: its bus name without the MPRIS prefix.
pub fn app_id_from_bus_name(bus_name: &str) -> &str {
    bus_name.strip_prefix(MPRIS_PREFIX).unwrap_or(bus_name)
}

impl MprisProvider {
    /// Connect to the session bus and discover running players.
    ///
    /// # Errors
    /// Returns `MediaError::InitializationFailed` if the session bus or the
    /// bus daemon cannot be reached.
    #[instrument(skip(config))]
    pub async fn connect(config: MediaConfig) -> Result<Self, MediaError> {
        let connection = Connection::session().await.map_err(|e| {
            MediaError::InitializationFailed(format!("D-Bus connection failed: {e}"))
        })?;

        let (notifications_tx, _) = broadcast::channel(256);

        let provider = Self {
            inner: Arc::new(MprisInner {
                connection,
                config,
                state: RwLock::new(MprisState {
                    players: HashMap::new(),
                    active: None,
                    next_order: 0,
                }),
                notifications_tx,
                discovery: Mutex::new(None),
            }),
        };

        provider.start_discovery().await?;
        provider.discover_existing_players().await?;

        Ok(provider)
    }

    /// Bus name of the active player, if any.
    pub async fn active_player(&self) -> Option<String> {
        self.inner.state.read().await.active.clone()
    }

    /// Bus names of every tracked player.
    pub async fn players(&self) -> Vec<String> {
        let state = self.inner.state.read().await;
        let mut players: Vec<(&String, u64)> = state
            .players
            .iter()
            .map(|(name, entry)| (name, entry.order))
            .collect();
        players.sort_by_key(|(_, order)| *order);
        players.into_iter().map(|(name, _)| name.clone()).collect()
    }

    /// Stop discovery and every per-player monitor.
    pub async fn shutdown(&self) {
        let discovery = self
            .inner
            .discovery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = discovery {
            handle.abort();
        }

        let mut state = self.inner.state.write().await;
        for (_, mut entry) in state.players.drain() {
            if let Some(handle) = entry.monitor.take() {
                handle.abort();
            }
        }
        state.active = None;
    }

    async fn start_discovery(&self) -> Result<(), MediaError> {
        let dbus_proxy = fdo::DBusProxy::new(&self.inner.connection)
            .await
            .map_err(|e| MediaError::InitializationFailed(format!("DBus proxy failed: {e}")))?;

        let mut name_owner_changed =
            dbus_proxy.receive_name_owner_changed().await.map_err(|e| {
                MediaError::InitializationFailed(format!("Signal subscription failed: {e}"))
            })?;

        let provider = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(signal) = name_owner_changed.next().await {
                let Ok(args) = signal.args() else {
                    continue;
                };

                if !args.name().starts_with(MPRIS_PREFIX) {
                    continue;
                }

                let bus_name = args.name().to_string();

                match (args.old_owner().as_deref(), args.new_owner().as_deref()) {
                    (Some(_), None) => provider.handle_player_removed(&bus_name).await,
                    (None, Some(_)) => {
                        if let Err(e) = provider.handle_player_added(&bus_name).await {
                            warn!("Failed to add player {bus_name}: {e}");
                        }
                    }
                    _ => {}
                }
            }

            debug!("Name owner stream ended");
        });

        *self
            .inner
            .discovery
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    async fn discover_existing_players(&self) -> Result<(), MediaError> {
        let dbus_proxy = fdo::DBusProxy::new(&self.inner.connection)
            .await
            .map_err(|e| MediaError::InitializationFailed(format!("DBus proxy failed: {e}")))?;

        let names = dbus_proxy.list_names().await?;

        for name in names {
            if !name.starts_with(MPRIS_PREFIX) {
                continue;
            }

            if let Err(e) = self.handle_player_added(name.as_str()).await {
                warn!("Failed to add existing player {}: {}", name, e);
            }
        }

        let players = self.inner.state.read().await.players.len();
        info!(players, "Finished discovering MPRIS players");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn handle_player_added(&self, bus_name: &str) -> Result<(), MediaError> {
        if !self.inner.config.accepts(app_id_from_bus_name(bus_name)) {
            info!("Ignoring player based on configuration");
            return Ok(());
        }

        let base_proxy = MediaPlayer2Proxy::builder(&self.inner.connection)
            .destination(bus_name.to_string())?
            .build()
            .await?;

        let player_proxy = MediaPlayer2PlayerProxy::builder(&self.inner.connection)
            .destination(bus_name.to_string())?
            .build()
            .await?;

        let identity = base_proxy.identity().await.ok().filter(|i| !i.is_empty());
        let status = player_proxy
            .playback_status()
            .await
            .map(|s| PlaybackStatus::from(s.as_str()))
            .unwrap_or_default();

        let active_changed = {
            let mut state = self.inner.state.write().await;
            let order = state.next_order;
            state.next_order += 1;

            state.players.insert(
                bus_name.to_string(),
                PlayerEntry {
                    proxy: player_proxy.clone(),
                    identity,
                    status,
                    order,
                    monitor: None,
                },
            );

            let previous = state.active.clone();
            if state.active.is_none() || status == PlaybackStatus::Playing {
                state.active = Some(bus_name.to_string());
            }
            previous != state.active
        };

        let monitor = tokio::spawn(self.clone().monitor_player(bus_name.to_string(), player_proxy));
        if let Some(entry) = self.inner.state.write().await.players.get_mut(bus_name) {
            entry.monitor = Some(monitor);
        }

        info!("MPRIS player added");
        if active_changed {
            self.notify(NotificationKind::SessionChanged).await;
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn handle_player_removed(&self, bus_name: &str) {
        let active_changed = {
            let mut state = self.inner.state.write().await;
            let Some(mut entry) = state.players.remove(bus_name) else {
                return;
            };

            if let Some(handle) = entry.monitor.take() {
                handle.abort();
            }

            if state.active.as_deref() == Some(bus_name) {
                state.active = fallback_player(&state.players);
                true
            } else {
                false
            }
        };

        info!("MPRIS player removed");
        if active_changed {
            self.notify(NotificationKind::SessionChanged).await;
        }
    }

    async fn monitor_player(self, bus_name: String, proxy: MediaPlayer2PlayerProxy<'static>) {
        let mut status_changes = proxy.receive_playback_status_changed().await;
        let mut metadata_changes = proxy.receive_metadata_changed().await;
        let mut seeks = match proxy.receive_seeked().await {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!("Cannot follow seeks for {bus_name}: {e}");
                None
            }
        };

        loop {
            tokio::select! {
                change = status_changes.next() => {
                    let Some(change) = change else { break };
                    let status = change
                        .get()
                        .await
                        .map(|s| PlaybackStatus::from(s.as_str()))
                        .unwrap_or_default();
                    self.handle_status_changed(&bus_name, status).await;
                }
                change = metadata_changes.next() => {
                    if change.is_none() {
                        break;
                    }
                    self.notify_if_active(&bus_name, NotificationKind::MediaPropertiesChanged).await;
                }
                seek = async {
                    match seeks.as_mut() {
                        Some(stream) => stream.next().await,
                        None => std::future::pending().await,
                    }
                } => {
                    if seek.is_none() {
                        seeks = None;
                        continue;
                    }
                    self.notify_if_active(&bus_name, NotificationKind::TimelineChanged).await;
                }
            }
        }

        debug!("Property streams ended for {bus_name}");
    }

    async fn handle_status_changed(&self, bus_name: &str, status: PlaybackStatus) {
        let (is_active, active_changed) = {
            let mut state = self.inner.state.write().await;
            let Some(entry) = state.players.get_mut(bus_name) else {
                return;
            };
            entry.status = status;

            let previous = state.active.clone();
            if status == PlaybackStatus::Playing {
                state.active = Some(bus_name.to_string());
            }

            (
                state.active.as_deref() == Some(bus_name),
                previous != state.active,
            )
        };

        if active_changed {
            self.notify(NotificationKind::SessionChanged).await;
        } else if is_active {
            self.notify(NotificationKind::PlaybackInfoChanged).await;
        }
    }

    async fn notify_if_active(&self, bus_name: &str, kind: NotificationKind) {
        let is_active = self.inner.state.read().await.active.as_deref() == Some(bus_name);
        if is_active {
            self.notify(kind).await;
        }
    }

    async fn notify(&self, kind: NotificationKind) {
        let session = match self.current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Failed to read session after {kind:?}: {e}");
                None
            }
        };

        let _ = self
            .inner
            .notifications_tx
            .send(ProviderNotification { kind, session });
    }

    async fn read_session(
        &self,
        bus_name: &str,
        proxy: &MediaPlayer2PlayerProxy<'static>,
        identity: Option<String>,
    ) -> RawSession {
        let metadata = match proxy.metadata().await {
            Ok(map) => TrackMetadata::from(map),
            Err(e) => {
                debug!("Metadata unavailable for {bus_name}: {e}");
                TrackMetadata::default()
            }
        };

        let status = proxy
            .playback_status()
            .await
            .map(|s| PlaybackStatus::from(s.as_str()))
            .unwrap_or_default();

        let position = proxy
            .position()
            .await
            .ok()
            .filter(|micros| *micros > 0)
            .map(|micros| Duration::from_micros(micros as u64))
            .unwrap_or(Duration::ZERO);
        let position_updated_at = SystemTime::now();

        let thumbnail = match metadata.art_url.as_deref() {
            Some(url) => match load_thumbnail(url).await {
                Ok(thumbnail) => Some(thumbnail),
                Err(e) => {
                    debug!("{e}");
                    None
                }
            },
            None => None,
        };

        RawSession {
            app_id: app_id_from_bus_name(bus_name).to_string(),
            app_display_name: identity,
            title: metadata.title,
            artist: metadata.artist,
            album: metadata.album,
            subtitle: metadata.album_artist,
            thumbnail,
            status,
            position,
            duration: metadata.length.unwrap_or(Duration::ZERO),
            position_updated_at,
        }
    }
}

fn fallback_player(players: &HashMap<String, PlayerEntry>) -> Option<String> {
    players
        .iter()
        .filter(|(_, entry)| entry.status == PlaybackStatus::Playing)
        .min_by_key(|(_, entry)| entry.order)
        .or_else(|| players.iter().min_by_key(|(_, entry)| entry.order))
        .map(|(name, _)| name.clone())
}

#[async_trait]
impl MediaProvider for MprisProvider {
    async fn current_session(&self) -> Result<Option<RawSession>, MediaError> {
        let active = {
            let state = self.inner.state.read().await;
            state.active.as_ref().and_then(|name| {
                state
                    .players
                    .get(name)
                    .map(|entry| (name.clone(), entry.proxy.clone(), entry.identity.clone()))
            })
        };

        let Some((bus_name, proxy, identity)) = active else {
            return Ok(None);
        };

        Ok(Some(self.read_session(&bus_name, &proxy, identity).await))
    }

    fn notifications(&self) -> BoxStream<'static, ProviderNotification> {
        BroadcastStream::new(self.inner.notifications_tx.subscribe())
            .filter_map(|item| async move {
                match item {
                    Ok(notification) => Some(notification),
                    Err(e) => {
                        warn!("Dropped MPRIS notifications: {e}");
                        None
                    }
                }
            })
            .boxed()
    }
}

//! Wiring between the tracker, the broadcast hub and the display.

use std::{net::SocketAddr, sync::Arc};

use tracing::{info, instrument, warn};

use crate::{
    Result,
    config::{Config, EventsConfig},
    display::{DisplayHandle, DisplayStatus, DisplayUpdate, TerminalDisplay},
    services::{
        broadcast::{BroadcastHub, BroadcastServer, WireEvent, encode},
        media::{EventKind, MediaProvider, SessionTracker, Subscription, TrackSnapshot},
    },
};

/// A running monitor: tracker, subscriber endpoint and display.
pub struct Monitor {
    tracker: SessionTracker,
    hub: BroadcastHub,
    server: Option<BroadcastServer>,
    display: Option<TerminalDisplay>,
    subscriptions: Vec<Subscription>,
}

impl Monitor {
    /// Start every component for `config`, reading playback from `provider`.
    ///
    /// The endpoint is bound before the tracker starts, so a port conflict
    /// fails fast without touching the provider. Whatever was already started
    /// is stopped again when a later step fails.
    ///
    /// # Errors
    /// Returns error if the display cannot draw, the endpoint cannot be
    /// bound or the tracker fails to start.
    #[instrument(skip_all)]
    pub async fn start(config: &Config, provider: Arc<dyn MediaProvider>) -> Result<Self> {
        let tracker = SessionTracker::new(provider, &config.media);
        let hub = BroadcastHub::new();

        let server = if config.server.enabled {
            let server = BroadcastServer::bind(&config.server.address(), hub.clone()).await?;
            server.start()?;
            Some(server)
        } else {
            hub.stop_accepting();
            None
        };

        let display = if config.display.enabled {
            match TerminalDisplay::start(&config.display) {
                Ok(display) => Some(display),
                Err(e) => {
                    stop_outputs(None, server.as_ref()).await;
                    return Err(e);
                }
            }
        } else {
            None
        };
        let display_handle = display
            .as_ref()
            .map(TerminalDisplay::handle)
            .unwrap_or_else(DisplayHandle::detached);

        let host = config.server.host.clone();
        let port = server
            .as_ref()
            .map(|server| server.local_addr().port())
            .unwrap_or(config.server.port);

        display_handle.send(DisplayUpdate::Header {
            host: host.clone(),
            port,
            clients: 0,
        });
        display_handle.send(DisplayUpdate::Status {
            status: DisplayStatus::Stopped,
            app_name: String::new(),
        });

        install_hub_observers(&hub, &tracker, &display_handle, host, port);

        let subscriptions = wire_listeners(
            &tracker,
            &hub,
            &display_handle,
            &config.events,
            config.display.show_logs,
        );

        if let Err(e) = tracker.start().await {
            stop_outputs(display.as_ref(), server.as_ref()).await;
            return Err(e.into());
        }

        info!(subscribers_endpoint = ?server.as_ref().map(BroadcastServer::local_addr), "Media monitor running");
        Ok(Self {
            tracker,
            hub,
            server,
            display,
            subscriptions,
        })
    }

    /// Tracker handle.
    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    /// Hub handle.
    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Address subscribers connect to, when the endpoint is enabled.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(BroadcastServer::local_addr)
    }

    /// Stop the display, then the endpoint, then the tracker.
    #[instrument(skip_all)]
    pub async fn stop(self) {
        stop_outputs(self.display.as_ref(), self.server.as_ref()).await;

        self.tracker.stop().await;
        drop(self.subscriptions);

        info!("Media monitor stopped");
    }
}

async fn stop_outputs(display: Option<&TerminalDisplay>, server: Option<&BroadcastServer>) {
    if let Some(display) = display {
        display.stop().await;
    }

    if let Some(server) = server {
        server.stop().await;
    }
}

fn install_hub_observers(
    hub: &BroadcastHub,
    tracker: &SessionTracker,
    display: &DisplayHandle,
    host: String,
    port: u16,
) {
    {
        let tracker = tracker.clone();
        let display = display.clone();
        let host = host.clone();
        hub.on_connect(move |connection, clients| {
            match encode(WireEvent::SessionInit, &tracker.current_snapshot()) {
                Ok(message) => connection.send(message),
                Err(e) => warn!("Cannot encode initial state: {e}"),
            }

            display.send(DisplayUpdate::Header {
                host: host.clone(),
                port,
                clients,
            });
        });
    }

    let display = display.clone();
    hub.on_disconnect(move |clients| {
        display.send(DisplayUpdate::Header {
            host: host.clone(),
            port,
            clients,
        });
    });
}

#[derive(Clone)]
struct Publisher {
    hub: BroadcastHub,
    display: DisplayHandle,
    show_logs: bool,
}

impl Publisher {
    fn publish(&self, event: WireEvent, snapshot: &TrackSnapshot) {
        let message = match encode(event, snapshot) {
            Ok(message) => message,
            Err(e) => {
                warn!(?event, "Cannot encode event: {e}");
                return;
            }
        };

        if self.show_logs {
            self.display.send(DisplayUpdate::Log(message.clone()));
        }

        self.hub.broadcast(&message);
    }
}

fn wire_listeners(
    tracker: &SessionTracker,
    hub: &BroadcastHub,
    display: &DisplayHandle,
    events: &EventsConfig,
    show_logs: bool,
) -> Vec<Subscription> {
    let publisher = Publisher {
        hub: hub.clone(),
        display: display.clone(),
        show_logs,
    };

    let session = {
        let publisher = publisher.clone();
        let enabled = events.session_changed;
        tracker.subscribe(EventKind::SessionChanged, move |snapshot| {
            publisher.display.send(DisplayUpdate::status(snapshot));
            publisher.display.send(DisplayUpdate::track(snapshot));
            publisher.display.send(DisplayUpdate::progress(snapshot));

            if enabled {
                publisher.publish(WireEvent::SessionChanged, snapshot);
            }
        })
    };

    let track = {
        let publisher = publisher.clone();
        let enabled = events.track_changed;
        tracker.subscribe(EventKind::TrackChanged, move |snapshot| {
            publisher.display.send(DisplayUpdate::status(snapshot));
            publisher.display.send(DisplayUpdate::track(snapshot));
            if !snapshot.is_playing {
                publisher.display.send(DisplayUpdate::progress(snapshot));
            }

            if enabled {
                publisher.publish(WireEvent::TrackChanged, snapshot);
            }
        })
    };

    let position = {
        let enabled = events.position_changed;
        tracker.subscribe(EventKind::PositionChanged, move |snapshot| {
            publisher.display.send(DisplayUpdate::progress(snapshot));

            if enabled {
                publisher.publish(WireEvent::PositionChanged, snapshot);
            }
        })
    };

    vec![session, track, position]
}

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::panic)]

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, SystemTime},
};

use super::{
    ChannelProvider, Clock, EventKind, IdentityMemo, MediaError, NotificationKind,
    PlaybackStatus, RawSession, SessionTracker, Thumbnail, TrackSnapshot, extrapolate_position,
    resolve_app_name, thumbnail_data_uri,
};

struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000)),
        })
    }

    fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type Recorded = Arc<Mutex<Vec<(EventKind, TrackSnapshot)>>>;

fn record_all(tracker: &SessionTracker) -> (Recorded, Vec<super::Subscription>) {
    let events: Recorded = Arc::new(Mutex::new(Vec::new()));
    let subscriptions = [
        EventKind::SessionChanged,
        EventKind::TrackChanged,
        EventKind::PositionChanged,
    ]
    .into_iter()
    .map(|kind| {
        let events = Arc::clone(&events);
        tracker.subscribe(kind, move |snapshot| {
            events.lock().unwrap().push((kind, snapshot.clone()));
        })
    })
    .collect();

    (events, subscriptions)
}

fn kinds(events: &Recorded) -> Vec<EventKind> {
    events.lock().unwrap().iter().map(|(kind, _)| *kind).collect()
}

fn session(clock: &ManualClock, title: &str, status: PlaybackStatus) -> RawSession {
    RawSession {
        app_id: "spotify".to_string(),
        title: title.to_string(),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        status,
        position: Duration::from_secs(10),
        duration: Duration::from_secs(200),
        position_updated_at: clock.now(),
        ..RawSession::default()
    }
}

fn tracker_with(clock: &Arc<ManualClock>) -> (ChannelProvider, SessionTracker) {
    let provider = ChannelProvider::new();
    let tracker = SessionTracker::with_clock(
        Arc::new(provider.clone()),
        Arc::clone(clock) as Arc<dyn Clock>,
        Duration::from_secs(3_600),
    );
    (provider, tracker)
}

#[test]
fn extrapolation_adds_elapsed_while_playing() {
    let position = extrapolate_position(
        Duration::from_secs(10),
        Duration::from_secs(200),
        true,
        Duration::from_secs(3),
    );
    assert_eq!(position, Duration::from_secs(13));

    let paused = extrapolate_position(
        Duration::from_secs(10),
        Duration::from_secs(200),
        false,
        Duration::from_secs(3),
    );
    assert_eq!(paused, Duration::from_secs(10));
}

#[test]
fn extrapolation_clamps_to_known_duration_only() {
    let clamped = extrapolate_position(
        Duration::from_secs(198),
        Duration::from_secs(200),
        true,
        Duration::from_secs(5),
    );
    assert_eq!(clamped, Duration::from_secs(200));

    let unbounded = extrapolate_position(
        Duration::from_secs(198),
        Duration::ZERO,
        true,
        Duration::from_secs(5),
    );
    assert_eq!(unbounded, Duration::from_secs(203));
}

#[test]
fn app_name_prefers_known_table() {
    assert_eq!(resolve_app_name("Spotify.exe", None), "Spotify");
    assert_eq!(
        resolve_app_name("MSEdge", Some("Edge Browser")),
        "Microsoft Edge"
    );
    assert_eq!(
        resolve_app_name("Microsoft.ZuneMusic_8wekyb3d8bbwe!Microsoft.ZuneMusic", None),
        "Groove Music"
    );
    assert_eq!(resolve_app_name("VLC", None), "VLC");
}

#[test]
fn app_name_falls_back_to_provider_then_id() {
    assert_eq!(resolve_app_name("mpv", Some("mpv Media Player")), "mpv Media Player");
    assert_eq!(resolve_app_name("mpv", Some("  ")), "mpv");
    assert_eq!(resolve_app_name("", None), "Unknown");
}

#[test]
fn thumbnail_uri_defaults_to_jpeg() {
    let thumbnail = Thumbnail {
        bytes: vec![0xff, 0xd8, 0xff],
        content_type: None,
    };
    assert_eq!(thumbnail_data_uri(&thumbnail), "data:image/jpeg;base64,/9j/");

    let png = Thumbnail {
        bytes: b"abc".to_vec(),
        content_type: Some("image/png".to_string()),
    };
    assert_eq!(thumbnail_data_uri(&png), "data:image/png;base64,YWJj");

    let empty = Thumbnail {
        bytes: Vec::new(),
        content_type: Some("image/png".to_string()),
    };
    assert_eq!(thumbnail_data_uri(&empty), "");
}

#[test]
fn snapshot_without_session_has_no_media() {
    let now = SystemTime::UNIX_EPOCH + Duration::from_secs(5);
    let snapshot = TrackSnapshot::from_optional_session(None, now);

    assert!(!snapshot.has_media);
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.position, Duration::ZERO);
    assert_eq!(snapshot.last_refresh, now);
}

#[test]
fn snapshot_extrapolates_reported_position() {
    let clock = ManualClock::new();
    let raw = session(&clock, "Song", PlaybackStatus::Playing);
    clock.advance(Duration::from_secs(3));

    let snapshot = TrackSnapshot::from_session(&raw, clock.now());

    assert!(snapshot.has_media);
    assert!(snapshot.is_playing);
    assert_eq!(snapshot.app_name, "Spotify");
    assert_eq!(snapshot.position, Duration::from_secs(13));
}

#[test]
fn memo_fires_both_on_first_observation() {
    let mut memo = IdentityMemo::default();
    let changes = memo.observe(&TrackSnapshot::default());

    assert!(changes.session);
    assert!(changes.track);

    let again = memo.observe(&TrackSnapshot::default());
    assert!(!again.session);
    assert!(!again.track);
}

#[test]
fn memo_ignores_position_only_changes() {
    let clock = ManualClock::new();
    let mut memo = IdentityMemo::default();
    let first = TrackSnapshot::from_session(
        &session(&clock, "Song", PlaybackStatus::Playing),
        clock.now(),
    );
    memo.observe(&first);

    let moved = TrackSnapshot {
        position: Duration::from_secs(90),
        ..first.clone()
    };
    let changes = memo.observe(&moved);

    assert!(!changes.session);
    assert!(!changes.track);
    assert_eq!(memo.last_track().map(|t| t.title.as_str()), Some("Song"));
}

#[test]
fn memo_play_state_changes_both_identities() {
    let clock = ManualClock::new();
    let mut memo = IdentityMemo::default();
    memo.observe(&TrackSnapshot::from_session(
        &session(&clock, "Song", PlaybackStatus::Playing),
        clock.now(),
    ));

    let changes = memo.observe(&TrackSnapshot::from_session(
        &session(&clock, "Song", PlaybackStatus::Paused),
        clock.now(),
    ));

    assert!(changes.session);
    assert!(changes.track);
}

#[test]
fn track_change_fires_once_without_session_change() {
    let clock = ManualClock::new();
    let (_provider, tracker) = tracker_with(&clock);
    tracker.refresh(Some(&session(&clock, "First", PlaybackStatus::Playing)));

    let (events, _subscriptions) = record_all(&tracker);
    tracker.refresh(Some(&session(&clock, "Second", PlaybackStatus::Playing)));

    assert_eq!(kinds(&events), vec![EventKind::TrackChanged]);
    let recorded = events.lock().unwrap();
    assert_eq!(recorded[0].1.title, "Second");
}

#[test]
fn session_change_fires_before_track_change() {
    let clock = ManualClock::new();
    let (_provider, tracker) = tracker_with(&clock);
    let (events, _subscriptions) = record_all(&tracker);

    tracker.refresh(Some(&session(&clock, "Song", PlaybackStatus::Playing)));

    assert_eq!(
        kinds(&events),
        vec![EventKind::SessionChanged, EventKind::TrackChanged]
    );
}

#[test]
fn tick_advances_and_clamps_position() {
    let clock = ManualClock::new();
    let (_provider, tracker) = tracker_with(&clock);
    tracker.refresh(Some(&session(&clock, "Song", PlaybackStatus::Playing)));
    let (events, _subscriptions) = record_all(&tracker);

    clock.advance(Duration::from_secs(3));
    tracker.tick();
    assert_eq!(tracker.current_snapshot().position, Duration::from_secs(13));

    clock.advance(Duration::from_secs(500));
    tracker.tick();
    assert_eq!(tracker.current_snapshot().position, Duration::from_secs(200));

    assert_eq!(
        kinds(&events),
        vec![EventKind::PositionChanged, EventKind::PositionChanged]
    );
}

#[test]
fn tick_is_silent_while_paused() {
    let clock = ManualClock::new();
    let (_provider, tracker) = tracker_with(&clock);
    tracker.refresh(Some(&session(&clock, "Song", PlaybackStatus::Paused)));
    let (events, _subscriptions) = record_all(&tracker);

    clock.advance(Duration::from_secs(3));
    tracker.tick();

    assert!(kinds(&events).is_empty());
    assert_eq!(tracker.current_snapshot().position, Duration::from_secs(10));
}

#[test]
fn dropped_subscription_stops_delivery() {
    let clock = ManualClock::new();
    let (_provider, tracker) = tracker_with(&clock);
    let (events, subscriptions) = record_all(&tracker);
    assert_eq!(tracker.listener_count(), 3);

    drop(subscriptions);
    tracker.refresh(Some(&session(&clock, "Song", PlaybackStatus::Playing)));

    assert_eq!(tracker.listener_count(), 0);
    assert!(kinds(&events).is_empty());
}

#[test]
fn listener_can_read_current_snapshot() {
    let clock = ManualClock::new();
    let (_provider, tracker) = tracker_with(&clock);
    let seen = Arc::new(Mutex::new(None));

    let _subscription = {
        let seen = Arc::clone(&seen);
        let handle = tracker.clone();
        tracker.subscribe(EventKind::TrackChanged, move |_| {
            *seen.lock().unwrap() = Some(handle.current_snapshot().title);
        })
    };
    tracker.refresh(Some(&session(&clock, "Song", PlaybackStatus::Playing)));

    assert_eq!(seen.lock().unwrap().as_deref(), Some("Song"));
}

#[tokio::test]
async fn start_takes_initial_snapshot() {
    let clock = ManualClock::new();
    let (provider, tracker) = tracker_with(&clock);
    provider.set_session(Some(session(&clock, "Song", PlaybackStatus::Playing)));
    let (events, _subscriptions) = record_all(&tracker);

    tracker.start().await.unwrap();

    assert!(tracker.is_running());
    assert_eq!(tracker.current_snapshot().title, "Song");
    assert_eq!(
        kinds(&events),
        vec![EventKind::SessionChanged, EventKind::TrackChanged]
    );

    tracker.stop().await;
}

#[tokio::test]
async fn second_start_is_rejected() {
    let clock = ManualClock::new();
    let (_provider, tracker) = tracker_with(&clock);

    tracker.start().await.unwrap();
    let err = tracker.start().await.unwrap_err();
    assert!(matches!(err, MediaError::AlreadyStarted));

    tracker.stop().await;
    let err = tracker.start().await.unwrap_err();
    assert!(matches!(err, MediaError::Stopped));
}

#[tokio::test]
async fn no_events_after_stop() {
    let clock = ManualClock::new();
    let (provider, tracker) = tracker_with(&clock);
    tracker.start().await.unwrap();
    let (events, _subscriptions) = record_all(&tracker);

    tracker.stop().await;
    tracker.stop().await;

    tracker.refresh(Some(&session(&clock, "Song", PlaybackStatus::Playing)));
    provider.publish(
        NotificationKind::SessionChanged,
        Some(session(&clock, "Other", PlaybackStatus::Playing)),
    );
    tracker.tick();

    assert!(kinds(&events).is_empty());
    assert_eq!(tracker.listener_count(), 0);
    assert!(!tracker.is_running());
}

#[tokio::test]
async fn stop_releases_provider_subscription() {
    let clock = ManualClock::new();
    let (provider, tracker) = tracker_with(&clock);

    tracker.start().await.unwrap();
    assert_eq!(provider.subscriber_count(), 1);

    tracker.stop().await;
    assert_eq!(provider.subscriber_count(), 0);
}

/// Wall clock that follows tokio's clock, so pausing tokio time pauses it.
struct RuntimeClock {
    origin: SystemTime,
    started: tokio::time::Instant,
}

impl RuntimeClock {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            origin: SystemTime::UNIX_EPOCH + Duration::from_secs(1_000),
            started: tokio::time::Instant::now(),
        })
    }
}

impl Clock for RuntimeClock {
    fn now(&self) -> SystemTime {
        self.origin + self.started.elapsed()
    }
}

fn positions(events: &Recorded) -> Vec<Duration> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter(|(kind, _)| *kind == EventKind::PositionChanged)
        .map(|(_, snapshot)| snapshot.position)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn ticker_emits_position_only_while_playing_and_until_stop() {
    let clock = RuntimeClock::new();
    let provider = ChannelProvider::new();
    let playing = RawSession {
        app_id: "spotify".to_string(),
        title: "Song".to_string(),
        status: PlaybackStatus::Playing,
        position: Duration::from_secs(10),
        duration: Duration::from_secs(200),
        position_updated_at: clock.now(),
        ..RawSession::default()
    };
    provider.set_session(Some(playing.clone()));

    let tracker = SessionTracker::with_clock(
        Arc::new(provider.clone()),
        Arc::clone(&clock) as Arc<dyn Clock>,
        Duration::from_millis(500),
    );
    let (events, _subscriptions) = record_all(&tracker);
    tracker.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(1_250)).await;

    let ticked = positions(&events);
    assert_eq!(ticked.len(), 2);
    assert!((10_500..10_510).contains(&ticked[0].as_millis()));
    assert!((11_000..11_010).contains(&ticked[1].as_millis()));

    provider.publish(
        NotificationKind::PlaybackInfoChanged,
        Some(RawSession {
            status: PlaybackStatus::Paused,
            ..playing.clone()
        }),
    );
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!tracker.current_snapshot().is_playing);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(positions(&events).len(), 2);

    provider.publish(
        NotificationKind::PlaybackInfoChanged,
        Some(RawSession {
            position_updated_at: clock.now(),
            ..playing
        }),
    );
    tokio::time::sleep(Duration::from_millis(600)).await;
    let resumed = positions(&events).len();
    assert!(resumed > 2);

    tracker.stop().await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(positions(&events).len(), resumed);
}

use std::{
    fmt,
    time::{Duration, SystemTime},
};

/// Current playback status reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Player is currently playing
    Playing,

    /// Player is paused
    Paused,

    /// Player is stopped
    #[default]
    Stopped,
}

impl From<&str> for PlaybackStatus {
    fn from(status: &str) -> Self {
        match status {
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => write!(f, "Playing"),
            Self::Paused => write!(f, "Paused"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Raw album art as handed over by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// Encoded image bytes
    pub bytes: Vec<u8>,

    /// MIME type of `bytes`, when the provider knows it
    pub content_type: Option<String>,
}

/// Full state of the active session as read from a provider.
///
/// Every field is already degraded: a property the provider failed to
/// deliver is empty or `None` rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSession {
    /// Identifier of the application owning the session
    pub app_id: String,

    /// Human-readable application name, if the provider has one
    pub app_display_name: Option<String>,

    /// Track title
    pub title: String,

    /// Track artist(s)
    pub artist: String,

    /// Album name
    pub album: String,

    /// Secondary title line
    pub subtitle: String,

    /// Album art
    pub thumbnail: Option<Thumbnail>,

    /// Playback status
    pub status: PlaybackStatus,

    /// Position at `position_updated_at`
    pub position: Duration,

    /// Track length, zero when unknown
    pub duration: Duration,

    /// Wall-clock instant `position` was last authoritative
    pub position_updated_at: SystemTime,
}

impl Default for RawSession {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_display_name: None,
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            subtitle: String::new(),
            thumbnail: None,
            status: PlaybackStatus::Stopped,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            position_updated_at: SystemTime::UNIX_EPOCH,
        }
    }
}

/// What kind of provider change triggered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The active session was replaced or went away
    SessionChanged,

    /// Title, artist, album or artwork changed
    MediaPropertiesChanged,

    /// Playing/paused/stopped changed
    PlaybackInfoChanged,

    /// Position or duration changed (seek, new timeline)
    TimelineChanged,
}

/// A change notification from a provider, carrying the session state
/// read right after the change. `session` is `None` when no session is active.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderNotification {
    /// Class of change
    pub kind: NotificationKind,

    /// Current active session state
    pub session: Option<RawSession>,
}

/// Events emitted by the session tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The active player or its play state changed
    SessionChanged,

    /// The loaded track or its play state changed
    TrackChanged,

    /// Periodic position update while playing
    PositionChanged,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionChanged => write!(f, "session_changed"),
            Self::TrackChanged => write!(f, "track_changed"),
            Self::PositionChanged => write!(f, "position_changed"),
        }
    }
}

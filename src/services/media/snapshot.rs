use std::time::{Duration, SystemTime};

use base64::{Engine, engine::general_purpose::STANDARD};

use super::{
    PlaybackStatus, RawSession, Thumbnail,
    clock::extrapolate_position,
    identity::{SessionIdentity, TrackIdentity, resolve_app_name},
};

const DEFAULT_THUMBNAIL_TYPE: &str = "image/jpeg";

/// One immutable observation of the playback state.
///
/// When `has_media` is false every content field is meaningless and
/// consumers must treat it as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSnapshot {
    /// Track title
    pub title: String,

    /// Track artist(s)
    pub artist: String,

    /// Album name
    pub album: String,

    /// Secondary title line
    pub subtitle: String,

    /// Friendly name of the source application
    pub app_name: String,

    /// Identifier of the source application
    pub app_id: String,

    /// Album art as a `data:` URI, empty when there is none
    pub thumbnail: String,

    /// Position since track start
    pub position: Duration,

    /// Track length, zero when unknown
    pub duration: Duration,

    /// Whether playback is running
    pub is_playing: bool,

    /// Whether any session is active
    pub has_media: bool,

    /// Wall-clock instant the snapshot was captured
    pub last_refresh: SystemTime,
}

impl TrackSnapshot {
    /// Snapshot describing "nothing is playing".
    pub fn no_media(now: SystemTime) -> Self {
        Self {
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            subtitle: String::new(),
            app_name: String::new(),
            app_id: String::new(),
            thumbnail: String::new(),
            position: Duration::ZERO,
            duration: Duration::ZERO,
            is_playing: false,
            has_media: false,
            last_refresh: now,
        }
    }

    /// Build a snapshot from the provider state, extrapolating the reported
    /// position up to `now` when the session is playing.
    pub fn from_session(session: &RawSession, now: SystemTime) -> Self {
        let is_playing = session.status == PlaybackStatus::Playing;
        let elapsed = now
            .duration_since(session.position_updated_at)
            .unwrap_or(Duration::ZERO);

        Self {
            title: session.title.clone(),
            artist: session.artist.clone(),
            album: session.album.clone(),
            subtitle: session.subtitle.clone(),
            app_name: resolve_app_name(&session.app_id, session.app_display_name.as_deref()),
            app_id: session.app_id.clone(),
            thumbnail: session
                .thumbnail
                .as_ref()
                .map(thumbnail_data_uri)
                .unwrap_or_default(),
            position: extrapolate_position(session.position, session.duration, is_playing, elapsed),
            duration: session.duration,
            is_playing,
            has_media: true,
            last_refresh: now,
        }
    }

    /// Build a snapshot, or the no-media snapshot when there is no session.
    pub fn from_optional_session(session: Option<&RawSession>, now: SystemTime) -> Self {
        match session {
            Some(session) => Self::from_session(session, now),
            None => Self::no_media(now),
        }
    }

    /// Which player is active and whether it plays.
    pub fn session_identity(&self) -> SessionIdentity {
        SessionIdentity {
            app_id: self.app_id.clone(),
            is_playing: self.is_playing,
        }
    }

    /// Which track is loaded and whether it plays.
    pub fn track_identity(&self) -> TrackIdentity {
        TrackIdentity {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            is_playing: self.is_playing,
        }
    }
}

impl Default for TrackSnapshot {
    fn default() -> Self {
        Self::no_media(SystemTime::UNIX_EPOCH)
    }
}

/// Encode album art as a `data:` URI usable directly as an image source.
/// Empty images produce an empty string.
pub fn thumbnail_data_uri(thumbnail: &Thumbnail) -> String {
    if thumbnail.bytes.is_empty() {
        return String::new();
    }

    let content_type = thumbnail
        .content_type
        .as_deref()
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or(DEFAULT_THUMBNAIL_TYPE);

    format!(
        "data:{content_type};base64,{}",
        STANDARD.encode(&thumbnail.bytes)
    )
}

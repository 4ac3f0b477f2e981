use serde::{Deserialize, Serialize};

use super::TransportError;
use crate::services::media::{EventKind, TrackSnapshot};

/// Event name carried by every message sent to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireEvent {
    /// Full state sent once to a freshly connected subscriber
    SessionInit,
    /// The active player or its play state changed
    SessionChanged,
    /// The loaded track or its play state changed
    TrackChanged,
    /// Periodic position update
    PositionChanged,
}

impl From<EventKind> for WireEvent {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::SessionChanged => Self::SessionChanged,
            EventKind::TrackChanged => Self::TrackChanged,
            EventKind::PositionChanged => Self::PositionChanged,
        }
    }
}

/// Snapshot as seen by subscribers. Times are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WirePayload {
    /// Track title
    pub title: String,
    /// Track artist(s)
    pub artist: String,
    /// Album name
    pub album: String,
    /// Friendly name of the source application
    pub app_name: String,
    /// Identifier of the source application
    pub app_id: String,
    /// Position in seconds
    pub position: u64,
    /// Duration in seconds
    pub duration: u64,
    /// Whether playback is running
    pub is_playing: bool,
    /// Whether any session is active
    pub has_media: bool,
    /// Album art as a `data:` URI
    pub thumbnail: String,
}

impl From<&TrackSnapshot> for WirePayload {
    fn from(snapshot: &TrackSnapshot) -> Self {
        if !snapshot.has_media {
            return Self::default();
        }

        Self {
            title: snapshot.title.clone(),
            artist: snapshot.artist.clone(),
            album: snapshot.album.clone(),
            app_name: snapshot.app_name.clone(),
            app_id: snapshot.app_id.clone(),
            position: snapshot.position.as_secs(),
            duration: snapshot.duration.as_secs(),
            is_playing: snapshot.is_playing,
            has_media: true,
            thumbnail: snapshot.thumbnail.clone(),
        }
    }
}

/// One text message on the wire: `{"event_name": ..., "payload": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// What happened
    pub event_name: WireEvent,
    /// State after the event
    pub payload: WirePayload,
}

impl WireMessage {
    /// Build the message for `event` from `snapshot`.
    pub fn new(event: WireEvent, snapshot: &TrackSnapshot) -> Self {
        Self {
            event_name: event,
            payload: WirePayload::from(snapshot),
        }
    }
}

/// Serialize `snapshot` as the JSON text message for `event`.
///
/// # Errors
/// Returns `TransportError::Encode` if serialization fails.
pub fn encode(event: WireEvent, snapshot: &TrackSnapshot) -> Result<String, TransportError> {
    Ok(serde_json::to_string(&WireMessage::new(event, snapshot))?)
}

//! Narrow projections of a snapshot used to decide which events fire.

use super::TrackSnapshot;

/// Active player identity: the app and whether it is playing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionIdentity {
    /// Identifier of the source application
    pub app_id: String,

    /// Whether playback is running
    pub is_playing: bool,
}

/// Loaded track identity: title, artist, album and whether it is playing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackIdentity {
    /// Track title
    pub title: String,

    /// Track artist(s)
    pub artist: String,

    /// Album name
    pub album: String,

    /// Whether playback is running
    pub is_playing: bool,
}

const KNOWN_APPS: &[(&str, &str)] = &[
    ("spotify", "Spotify"),
    ("msedge", "Microsoft Edge"),
    ("chrome", "Google Chrome"),
    ("chromium", "Chromium"),
    ("firefox", "Firefox"),
    ("zunemusic", "Groove Music"),
    ("vlc", "VLC"),
];

/// Friendly application name for a session.
///
/// Known app ids are matched by case-insensitive substring first. Unknown
/// apps use the provider's own name when it has one, then the raw id.
pub fn resolve_app_name(app_id: &str, provider_name: Option<&str>) -> String {
    let lower_id = app_id.to_lowercase();

    if let Some((_, name)) = KNOWN_APPS
        .iter()
        .find(|(pattern, _)| lower_id.contains(pattern))
    {
        return (*name).to_string();
    }

    if let Some(name) = provider_name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    if app_id.is_empty() {
        "Unknown".to_string()
    } else {
        app_id.to_string()
    }
}

/// Last emitted identities, used to decide which events a new snapshot fires.
///
/// Nothing has been emitted before the first observation, so the first
/// snapshot always fires both events.
#[derive(Debug, Clone, Default)]
pub struct IdentityMemo {
    session: Option<SessionIdentity>,
    track: Option<TrackIdentity>,
}

/// Events decided for one observation, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdentityChanges {
    /// Session identity differs from the last emitted one
    pub session: bool,

    /// Track identity differs from the last emitted one
    pub track: bool,
}

impl IdentityMemo {
    /// Compare `snapshot` against the memo and remember whatever changed.
    ///
    /// The two checks are independent: one snapshot can change both.
    pub fn observe(&mut self, snapshot: &TrackSnapshot) -> IdentityChanges {
        let session = snapshot.session_identity();
        let track = snapshot.track_identity();

        let session_changed = self.session.as_ref() != Some(&session);
        if session_changed {
            self.session = Some(session);
        }

        let track_changed = self.track.as_ref() != Some(&track);
        if track_changed {
            self.track = Some(track);
        }

        IdentityChanges {
            session: session_changed,
            track: track_changed,
        }
    }

    /// Last emitted session identity.
    pub fn last_session(&self) -> Option<&SessionIdentity> {
        self.session.as_ref()
    }

    /// Last emitted track identity.
    pub fn last_track(&self) -> Option<&TrackIdentity> {
        self.track.as_ref()
    }
}

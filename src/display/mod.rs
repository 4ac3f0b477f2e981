//! Terminal now-playing box.
//!
//! Tracker listeners turn snapshots into [`DisplayUpdate`]s and push them
//! through a [`DisplayHandle`]; a blocking render thread owns the terminal.

mod render;
mod terminal;

#[cfg(test)]
mod tests;

use std::time::Duration;

pub use render::{DisplayStatus, client_label, format_time, log_lines, progress_bar, truncate};
pub use terminal::{DisplayHandle, Screen, TerminalDisplay};

use crate::services::media::TrackSnapshot;

/// One redraw request for a region of the box
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayUpdate {
    /// Endpoint and subscriber count
    Header {
        /// Host subscribers connect to
        host: String,
        /// Port subscribers connect to
        port: u16,
        /// Live subscriber count
        clients: usize,
    },

    /// Playback state and source application
    Status {
        /// Playback state
        status: DisplayStatus,
        /// Friendly application name, empty when unknown
        app_name: String,
    },

    /// Title, artist and album rows
    Track {
        /// Track title
        title: String,
        /// Track artist(s)
        artist: String,
        /// Album name
        album: String,
    },

    /// Progress bar and times
    Progress {
        /// Elapsed time
        position: Duration,
        /// Track length
        duration: Duration,
        /// Whether playback is running
        is_playing: bool,
    },

    /// Last message sent to subscribers
    Log(String),
}

impl DisplayUpdate {
    /// Status row for `snapshot`.
    pub fn status(snapshot: &TrackSnapshot) -> Self {
        Self::Status {
            status: DisplayStatus::of(snapshot),
            app_name: if snapshot.has_media {
                snapshot.app_name.clone()
            } else {
                String::new()
            },
        }
    }

    /// Track rows for `snapshot`, blank without media.
    pub fn track(snapshot: &TrackSnapshot) -> Self {
        if !snapshot.has_media {
            return Self::Track {
                title: String::new(),
                artist: String::new(),
                album: String::new(),
            };
        }

        Self::Track {
            title: snapshot.title.clone(),
            artist: snapshot.artist.clone(),
            album: snapshot.album.clone(),
        }
    }

    /// Progress row for `snapshot`, empty without media.
    pub fn progress(snapshot: &TrackSnapshot) -> Self {
        if !snapshot.has_media {
            return Self::Progress {
                position: Duration::ZERO,
                duration: Duration::ZERO,
                is_playing: false,
            };
        }

        Self::Progress {
            position: snapshot.position,
            duration: snapshot.duration,
            is_playing: snapshot.is_playing,
        }
    }
}

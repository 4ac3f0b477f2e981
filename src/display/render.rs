use std::{fmt, time::Duration};

use crate::services::media::TrackSnapshot;

/// Playback state shown on the status row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    /// Playback running
    Playing,
    /// Session present but not playing
    Paused,
    /// Nothing reported yet
    Stopped,
    /// No active session
    NoMedia,
}

impl DisplayStatus {
    /// Status of `snapshot` as shown to the user.
    pub fn of(snapshot: &TrackSnapshot) -> Self {
        if !snapshot.has_media {
            Self::NoMedia
        } else if snapshot.is_playing {
            Self::Playing
        } else {
            Self::Paused
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => write!(f, "Playing"),
            Self::Paused => write!(f, "Paused"),
            Self::Stopped => write!(f, "Stopped"),
            Self::NoMedia => write!(f, "No Media"),
        }
    }
}

/// `mm:ss`, with minutes growing past two digits for long tracks.
pub fn format_time(time: Duration) -> String {
    let seconds = time.as_secs();
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Cut `text` to at most `max_chars` characters, ending in `...` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    if max_chars < 3 {
        return text.chars().take(max_chars).collect();
    }

    let mut cut: String = text.chars().take(max_chars - 3).collect();
    cut.push_str("...");
    cut
}

/// Progress bar of exactly `width` cells.
///
/// Elapsed cells are solid, followed by a two-cell fading edge.
pub fn progress_bar(position: Duration, duration: Duration, width: usize) -> String {
    let filled = if duration.is_zero() {
        0
    } else {
        let ratio = position.as_millis().min(duration.as_millis()) * width as u128
            / duration.as_millis();
        ratio as usize
    };

    (0..width)
        .map(|cell| {
            if cell < filled {
                '█'
            } else if cell == filled {
                '▓'
            } else if cell == filled + 1 {
                '▒'
            } else {
                '░'
            }
        })
        .collect()
}

/// "1 client", "3 clients"
pub fn client_label(count: usize) -> String {
    if count == 1 {
        "1 client".to_string()
    } else {
        format!("{count} clients")
    }
}

/// Split a log message into at most `max_lines` rows of `max_width`
/// characters. Rows followed by more text end in `...`.
pub fn log_lines(message: &str, max_width: usize, max_lines: usize) -> Vec<String> {
    let chars: Vec<char> = message.chars().collect();
    if max_width == 0 {
        return Vec::new();
    }

    chars
        .chunks(max_width)
        .take(max_lines)
        .enumerate()
        .map(|(index, chunk)| {
            let mut line: String = chunk.iter().collect();
            if (index + 1) * max_width < chars.len() {
                line.push_str("...");
            }
            line
        })
        .collect()
}

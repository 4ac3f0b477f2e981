#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::time::Duration;

use super::{
    DisplayStatus, DisplayUpdate, Screen, client_label, format_time, log_lines, progress_bar,
    truncate,
};
use crate::services::media::TrackSnapshot;

#[test]
fn format_time_pads_minutes_and_seconds() {
    assert_eq!(format_time(Duration::ZERO), "00:00");
    assert_eq!(format_time(Duration::from_millis(65_900)), "01:05");
    assert_eq!(format_time(Duration::from_secs(6_000)), "100:00");
}

#[test]
fn truncate_keeps_short_text() {
    assert_eq!(truncate("Song", 10), "Song");
    assert_eq!(truncate("exactly", 7), "exactly");
}

#[test]
fn truncate_counts_characters_not_bytes() {
    assert_eq!(truncate("Ünïcödé title", 8), "Ünïcö...");
    assert_eq!(truncate("abcdef", 2), "ab");
}

#[test]
fn progress_bar_has_fading_edge() {
    let bar = progress_bar(Duration::from_secs(50), Duration::from_secs(100), 10);

    assert_eq!(bar, "█████▓▒░░░");
    assert_eq!(bar.chars().count(), 10);
}

#[test]
fn progress_bar_without_duration_is_empty() {
    let bar = progress_bar(Duration::from_secs(50), Duration::ZERO, 5);
    assert_eq!(bar, "▓▒░░░");
}

#[test]
fn progress_bar_full_track() {
    let bar = progress_bar(Duration::from_secs(300), Duration::from_secs(200), 4);
    assert_eq!(bar, "████");
}

#[test]
fn client_label_pluralizes() {
    assert_eq!(client_label(0), "0 clients");
    assert_eq!(client_label(1), "1 client");
    assert_eq!(client_label(3), "3 clients");
}

#[test]
fn log_lines_wrap_and_mark_continuation() {
    let lines = log_lines("abcdefghij", 4, 10);
    assert_eq!(lines, vec!["abcd...", "efgh...", "ij"]);

    let capped = log_lines("abcdefghij", 4, 1);
    assert_eq!(capped, vec!["abcd..."]);
}

#[test]
fn status_reflects_snapshot() {
    let mut snapshot = TrackSnapshot::default();
    assert_eq!(DisplayStatus::of(&snapshot), DisplayStatus::NoMedia);

    snapshot.has_media = true;
    assert_eq!(DisplayStatus::of(&snapshot), DisplayStatus::Paused);

    snapshot.is_playing = true;
    assert_eq!(DisplayStatus::of(&snapshot), DisplayStatus::Playing);
    assert_eq!(DisplayStatus::NoMedia.to_string(), "No Media");
}

#[test]
fn updates_blank_stale_content_without_media() {
    let snapshot = TrackSnapshot {
        title: "Stale".to_string(),
        app_name: "Spotify".to_string(),
        position: Duration::from_secs(9),
        ..TrackSnapshot::default()
    };

    assert_eq!(
        DisplayUpdate::status(&snapshot),
        DisplayUpdate::Status {
            status: DisplayStatus::NoMedia,
            app_name: String::new(),
        }
    );
    assert_eq!(
        DisplayUpdate::track(&snapshot),
        DisplayUpdate::Track {
            title: String::new(),
            artist: String::new(),
            album: String::new(),
        }
    );
    assert_eq!(
        DisplayUpdate::progress(&snapshot),
        DisplayUpdate::Progress {
            position: Duration::ZERO,
            duration: Duration::ZERO,
            is_playing: false,
        }
    );
}

#[test]
fn screen_draws_track_rows() {
    let mut screen = Screen::new(Vec::new(), 40, false);
    screen.draw_frame().unwrap();
    screen
        .apply(&DisplayUpdate::Track {
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            album: String::new(),
        })
        .unwrap();
    screen
        .apply(&DisplayUpdate::Progress {
            position: Duration::from_secs(65),
            duration: Duration::from_secs(200),
            is_playing: true,
        })
        .unwrap();

    let output = String::from_utf8_lossy(screen.output());
    assert!(output.contains("┌"));
    assert!(output.contains("♫ Song"));
    assert!(output.contains("@ Artist"));
    assert!(output.contains("01:05 / 03:20"));
}

#[test]
fn screen_ignores_logs_unless_enabled() {
    let mut quiet = Screen::new(Vec::new(), 40, false);
    quiet.apply(&DisplayUpdate::Log("{\"event_name\":1}".to_string())).unwrap();
    assert!(!String::from_utf8_lossy(quiet.output()).contains("event_name"));

    let mut verbose = Screen::new(Vec::new(), 40, true);
    verbose.apply(&DisplayUpdate::Log("{\"event_name\":1}".to_string())).unwrap();
    assert!(String::from_utf8_lossy(verbose.output()).contains("event_name"));
}

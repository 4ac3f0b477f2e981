//! Unit tests for config module
//!
//! Tests configuration types, defaults, and TOML parsing.
//! No filesystem dependencies - all in-memory.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::panic)]

use std::time::Duration;

use crate::{
    MonitorError,
    config::{Config, LogLevel, MediaConfig},
};

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.general.log_level, LogLevel::Info);
    assert!(config.server.enabled);
    assert_eq!(config.server.port, 7777);
    assert_eq!(config.media.tick_interval(), Duration::from_millis(500));
    assert!(config.events.session_changed);
    assert!(config.events.track_changed);
    assert!(config.events.position_changed);
    assert!(config.display.enabled);
}

#[test]
fn config_serialize_toml() {
    let config = Config::default();

    let toml_str = toml::to_string(&config).unwrap();
    assert!(toml_str.contains("[general]"));
    assert!(toml_str.contains("[server]"));
    assert!(toml_str.contains("[events]"));
}

#[test]
fn config_deserialize_toml() {
    let toml_str = r#"
        [general]
        log_level = "debug"

        [server]
        port = 9000

        [media]
        app_filter = "spotify"

        [events]
        position_changed = false
    "#;

    let config = Config::from_toml_str(toml_str).unwrap();

    assert_eq!(config.general.log_level, LogLevel::Debug);
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.media.app_filter, "spotify");
    assert!(!config.events.position_changed);
    assert!(config.events.track_changed);
}

#[test]
fn config_serialize_roundtrip() {
    let original = Config::default();

    let toml_str = toml::to_string(&original).unwrap();
    let deserialized = Config::from_toml_str(&toml_str).unwrap();

    assert_eq!(original, deserialized);
}

#[test]
fn config_empty_toml() {
    let config = Config::from_toml_str("").unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn config_rejects_port_zero() {
    let err = Config::from_toml_str("[server]\nport = 0\n").unwrap_err();

    match err {
        MonitorError::Config { field, .. } => assert_eq!(field, "server.port"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn config_reports_parse_location() {
    let err = Config::from_toml_str("[server\nport = 1").unwrap_err();

    match err {
        MonitorError::TomlParseError { location, .. } => assert_eq!(location, "string"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn log_level_parses_case_insensitively() {
    assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
    assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
    assert_eq!(LogLevel::Trace.to_string(), "trace");
    assert!("loud".parse::<LogLevel>().is_err());
}

#[test]
fn media_filter_matches_substring_ignoring_case() {
    let config = MediaConfig {
        app_filter: "Spotify".to_string(),
        ..MediaConfig::default()
    };

    assert!(config.accepts("org.mpris.MediaPlayer2.spotify"));
    assert!(!config.accepts("org.mpris.MediaPlayer2.firefox.instance_1_42"));
}

#[test]
fn media_ignored_players_win_over_filter() {
    let config = MediaConfig {
        ignored_players: vec!["firefox".to_string()],
        ..MediaConfig::default()
    };

    assert!(config.accepts("spotify"));
    assert!(!config.accepts("org.mpris.MediaPlayer2.firefox.instance_1_42"));
}

#[test]
fn tick_interval_has_floor() {
    let config = MediaConfig {
        tick_interval_ms: 0,
        ..MediaConfig::default()
    };

    assert_eq!(config.tick_interval(), Duration::from_millis(10));
}

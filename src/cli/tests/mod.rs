#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::fs;

use clap::Parser;

use super::{Cli, config_schema, formatting::format_error, render_config};
use crate::config::{Config, LogLevel};

#[test]
fn parses_short_flags() {
    let cli = Cli::try_parse_from(["media-monitor", "-l", "-p", "9000"]).unwrap();

    assert!(cli.show_logs);
    assert_eq!(cli.port, Some(9000));
    assert!(!cli.no_display);
}

#[test]
fn parses_log_level_case_insensitively() {
    let cli = Cli::try_parse_from(["media-monitor", "--log-level", "DEBUG"]).unwrap();
    assert_eq!(cli.log_level, Some(LogLevel::Debug));

    assert!(Cli::try_parse_from(["media-monitor", "--log-level", "loud"]).is_err());
}

#[test]
fn rejects_out_of_range_port() {
    assert!(Cli::try_parse_from(["media-monitor", "--port", "70000"]).is_err());
}

#[test]
fn overrides_only_given_values() {
    let cli = Cli::try_parse_from([
        "media-monitor",
        "--no-display",
        "--app-filter",
        "spotify",
        "--host",
        "127.0.0.1",
    ])
    .unwrap();
    let mut config = Config::default();

    cli.apply_overrides(&mut config);

    assert!(!config.display.enabled);
    assert_eq!(config.media.app_filter, "spotify");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 7777);
    assert_eq!(config.general.log_level, LogLevel::Info);
}

#[test]
fn no_flags_leave_config_untouched() {
    let cli = Cli::try_parse_from(["media-monitor"]).unwrap();
    let mut config = Config::default();

    cli.apply_overrides(&mut config);

    assert_eq!(config, Config::default());
}

#[test]
fn error_formatting_wraps_text() {
    let formatted = format_error("boom");
    assert!(formatted.contains("boom"));
    assert!(formatted.ends_with("\x1b[0m"));
}

#[test]
fn schema_is_available_when_config_file_is_broken() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[server]\nport = \"not a number\"\n").unwrap();

    let cli = Cli::try_parse_from([
        "media-monitor",
        "--config-schema",
        "--config",
        path.to_str().unwrap(),
    ])
    .unwrap();

    assert!(cli.config_schema);
    assert!(cli.load_config().is_err());

    let schema = config_schema().unwrap();
    assert!(schema.contains("\"server\""));
    assert!(schema.contains("\"tick_interval_ms\""));
}

#[test]
fn load_config_validates_after_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[server]\nport = 8000\n").unwrap();
    let path = path.to_str().unwrap();

    let zero_port =
        Cli::try_parse_from(["media-monitor", "--config", path, "--port", "0"]).unwrap();
    assert!(zero_port.load_config().is_err());

    let with_port =
        Cli::try_parse_from(["media-monitor", "--config", path, "--port", "9100"]).unwrap();
    let config = with_port.load_config().unwrap();
    assert_eq!(config.server.port, 9100);

    let rendered = render_config(&config).unwrap();
    assert!(rendered.contains("port = 9100"));
}

//! Command-line interface.
//!
//! Flags override the matching values of the loaded configuration file.

pub mod formatting;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::Parser;

use crate::{
    MonitorError, Result,
    config::{Config, LogLevel},
};

/// Monitor the system's media playback and broadcast it over websockets
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "media-monitor", version)]
#[command(about = "Monitor media playback and broadcast it to websocket subscribers")]
pub struct Cli {
    /// Configuration file to read instead of the default location
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Port subscribers connect to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Interface address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Show websocket messages next to the display
    #[arg(short = 'l', long)]
    pub show_logs: bool,

    /// Run without the terminal display and log to stdout instead
    #[arg(long)]
    pub no_display: bool,

    /// Only follow players whose id contains this text
    #[arg(long, value_name = "TEXT")]
    pub app_filter: Option<String>,

    /// Log verbosity (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub dump_config: bool,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    pub config_schema: bool,
}

impl Cli {
    /// Load the configuration file, apply the flags and validate the result.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_path(path)?,
            None => Config::load()?,
        };
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply every flag that was given on top of `config`.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }

        if self.show_logs {
            config.display.show_logs = true;
        }

        if self.no_display {
            config.display.enabled = false;
        }

        if let Some(filter) = &self.app_filter {
            config.media.app_filter = filter.clone();
        }

        if let Some(level) = self.log_level {
            config.general.log_level = level;
        }
    }
}

/// JSON schema of the configuration file. Needs no configuration loaded.
///
/// # Errors
/// Returns `MonitorError::Serialize` if the schema cannot be rendered.
pub fn config_schema() -> Result<String> {
    let schema = schemars::schema_for!(Config);
    serde_json::to_string_pretty(&schema).map_err(|e| MonitorError::Serialize {
        what: "config schema".to_string(),
        details: e.to_string(),
    })
}

/// `config` rendered as TOML.
///
/// # Errors
/// Returns `MonitorError::Serialize` if a value has no TOML form.
pub fn render_config(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| MonitorError::Serialize {
        what: "config".to_string(),
        details: e.to_string(),
    })
}

use std::{fs, path::Path};

use tracing::{debug, info, instrument};

use super::{Config, ConfigPaths};
use crate::{MonitorError, Result};

impl Config {
    /// Load the configuration from the default location.
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    /// Returns error if the config directory cannot be determined or the
    /// file exists but cannot be read or parsed.
    #[instrument]
    pub fn load() -> Result<Config> {
        let path = ConfigPaths::main_config()?;

        if !path.exists() {
            info!(path = %path.display(), "No configuration file found, using defaults");
            return Ok(Config::default());
        }

        Self::load_from_path(&path)
    }

    /// Load and validate the configuration stored at `path`.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not valid TOML or fails validation.
    pub fn load_from_path(path: &Path) -> Result<Config> {
        debug!(path = %path.display(), "Loading configuration");
        let content = fs::read_to_string(path)?;

        let config: Config =
            toml::from_str(&content).map_err(|e| MonitorError::toml_parse(e, Some(path)))?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration from an in-memory TOML document.
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Config> {
        let config: Config =
            toml::from_str(content).map_err(|e| MonitorError::toml_parse(e, None))?;
        config.validate()?;

        Ok(config)
    }

    /// Check values that parse but cannot work.
    ///
    /// # Errors
    /// Returns `MonitorError::Config` naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.server.enabled && self.server.port == 0 {
            return Err(MonitorError::Config {
                field: "server.port".to_string(),
                reason: "port 0 is not a fixed endpoint".to_string(),
            });
        }

        if self.server.host.trim().is_empty() {
            return Err(MonitorError::Config {
                field: "server.host".to_string(),
                reason: "host must not be empty".to_string(),
            });
        }

        if self.display.width < 30 {
            return Err(MonitorError::Config {
                field: "display.width".to_string(),
                reason: format!("width {} is below the minimum of 30", self.display.width),
            });
        }

        Ok(())
    }
}

//! Configuration schema definitions and loading.
//!
//! Defines the complete configuration structure for the media monitor.
//! The configuration is read once at startup and handed to the components
//! that need it; nothing here is process-global.

mod display;
mod events;
mod general;
mod loading;
mod media;
mod paths;
mod server;

#[cfg(test)]
mod tests;

pub use display::DisplayConfig;
pub use events::EventsConfig;
pub use general::{GeneralConfig, LogLevel};
pub use media::MediaConfig;
pub use paths::ConfigPaths;
pub use server::ServerConfig;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Main configuration structure for the media monitor.
///
/// Represents the complete configuration schema that can be loaded
/// from a TOML file. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Subscriber endpoint settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Session selection and tracking settings.
    #[serde(default)]
    pub media: MediaConfig,

    /// Which tracker events are broadcast to subscribers.
    #[serde(default)]
    pub events: EventsConfig,

    /// Terminal display settings.
    #[serde(default)]
    pub display: DisplayConfig,
}

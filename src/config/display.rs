use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Terminal display configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Draw the now-playing box in the terminal.
    pub enabled: bool,

    /// Box width in columns.
    pub width: u16,

    /// Echo every outgoing message below the box.
    pub show_logs: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 70,
            show_logs: false,
        }
    }
}

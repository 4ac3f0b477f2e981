use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-event broadcast switches.
///
/// A disabled event is still tracked and still drives the display; it is
/// only withheld from subscribers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast `session_changed` messages.
    pub session_changed: bool,

    /// Broadcast `track_changed` messages.
    pub track_changed: bool,

    /// Broadcast `position_changed` messages.
    pub position_changed: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            session_changed: true,
            track_changed: true,
            position_changed: true,
        }
    }
}

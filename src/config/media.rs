use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Session tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MediaConfig {
    /// Only track sessions whose app id contains this text (case-insensitive).
    /// Empty tracks every session.
    pub app_filter: String,

    /// App id patterns that are never tracked
    pub ignored_players: Vec<String>,

    /// Interval between position ticks in milliseconds.
    pub tick_interval_ms: u64,
}

impl MediaConfig {
    /// Tick interval as a `Duration`, never shorter than 10ms.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(10))
    }

    /// Whether a session with this app id may be tracked.
    pub fn accepts(&self, app_id: &str) -> bool {
        let app_id = app_id.to_lowercase();

        if self
            .ignored_players
            .iter()
            .any(|pattern| !pattern.is_empty() && app_id.contains(&pattern.to_lowercase()))
        {
            return false;
        }

        self.app_filter.is_empty() || app_id.contains(&self.app_filter.to_lowercase())
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            app_filter: String::new(),
            ignored_players: Vec::new(),
            tick_interval_ms: 500,
        }
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default port subscribers connect to.
pub const DEFAULT_PORT: u16 = 7777;

/// Subscriber endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Whether the websocket endpoint is started at all.
    pub enabled: bool,

    /// Interface address to listen on.
    pub host: String,

    /// TCP port to listen on.
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` string passed to the listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

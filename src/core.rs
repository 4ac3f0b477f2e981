use std::{fmt, io, path::Path, result};

use thiserror::Error;

use crate::services::{broadcast::TransportError, media::MediaError};

/// Error types for the media monitor application.
///
/// Covers configuration loading, startup and the top-level failures of the
/// media and broadcast services. Service-local failures that are recovered
/// in place never surface here.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration validation error
    #[error("invalid config field '{field}': {reason}")]
    Config {
        /// The field that is invalid
        field: String,
        /// Reason why the field is invalid
        reason: String,
    },

    /// Standard I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParseError {
        /// Location of TOML being parsed (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// Media provider failed to initialize
    #[error("media provider error: {0}")]
    Provider(#[from] MediaError),

    /// Broadcast transport failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Terminal display failure
    #[error("display error: {0}")]
    Display(String),

    /// Logging could not be initialized
    #[error("failed to initialize logging: {0}")]
    Logging(String),

    /// A value could not be rendered for output
    #[error("failed to serialize {what}: {details}")]
    Serialize {
        /// What was being serialized
        what: String,
        /// Underlying failure
        details: String,
    },
}

/// A specialized `Result` type for media monitor operations.
pub type Result<T> = result::Result<T, MonitorError>;

impl MonitorError {
    /// Creates a TOML parsing error with optional file path context.
    ///
    /// # Arguments
    ///
    /// * `error` - The underlying parsing error
    /// * `path` - Optional path to the file that failed to parse
    pub fn toml_parse(error: impl fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => {
                let clean_path = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
                clean_path.to_string_lossy().to_string()
            }
            None => "string".to_string(),
        };

        MonitorError::TomlParseError {
            location,
            details: error.to_string(),
        }
    }
}

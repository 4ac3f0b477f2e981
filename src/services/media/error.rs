/// Errors that can occur while reading playback state from a provider
#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    /// D-Bus communication error
    #[error("D-Bus operation failed: {0}")]
    DbusError(#[from] zbus::Error),

    /// D-Bus daemon interface error
    #[error("D-Bus daemon request failed: {0}")]
    FdoError(#[from] zbus::fdo::Error),

    /// Failed to initialize the media provider
    #[error("Failed to initialize media provider: {0}")]
    InitializationFailed(String),

    /// Album art could not be loaded
    #[error("Failed to read thumbnail from {source_uri}: {details}")]
    ThumbnailUnavailable {
        /// Where the thumbnail was expected
        source_uri: String,
        /// Underlying failure
        details: String,
    },

    /// `start()` was called on a tracker that is already running
    #[error("Session tracker already started")]
    AlreadyStarted,

    /// The tracker was stopped and cannot be restarted
    #[error("Session tracker has been stopped")]
    Stopped,
}

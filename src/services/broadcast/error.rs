/// Errors raised by the broadcast transport
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// Writing one message to a subscriber failed
    #[error("failed to write to subscriber: {0}")]
    WriteFailed(String),

    /// The connection or hub no longer accepts work
    #[error("connection closed")]
    Closed,

    /// The listening endpoint could not be bound
    #[error("cannot bind {address}: {details}")]
    Bind {
        /// Address that was requested
        address: String,
        /// Underlying failure
        details: String,
    },

    /// The server task failed or was started twice
    #[error("broadcast server task failed: {0}")]
    ServerTask(String),

    /// An event could not be serialized
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Websocket broadcast transport
pub mod broadcast;
/// Playback state tracking
pub mod media;

//! MPRIS backend for the session tracker.
//!
//! Discovers players on the session bus, follows the one that most
//! recently started playing and turns its property changes into provider
//! notifications.

mod metadata;
mod provider;
mod proxy;
mod thumbnail;

pub use metadata::TrackMetadata;
pub use provider::{MprisProvider, app_id_from_bus_name};
pub use proxy::{MPRIS_PREFIX, MediaPlayer2PlayerProxy, MediaPlayer2Proxy};
pub use thumbnail::load_thumbnail;

//! Playback state tracking.
//!
//! A [`MediaProvider`] reports what the system is playing; the
//! [`SessionTracker`] turns that into [`TrackSnapshot`]s and fires
//! session, track and position events to its listeners.

mod channel;
mod clock;
mod error;
mod identity;
/// MPRIS provider over D-Bus
pub mod mpris;
mod provider;
mod snapshot;
mod subscription;
mod tracker;
mod types;

#[cfg(test)]
mod tests;

pub use channel::ChannelProvider;
pub use clock::{Clock, SystemClock, extrapolate_position};
pub use error::MediaError;
pub use identity::{
    IdentityChanges, IdentityMemo, SessionIdentity, TrackIdentity, resolve_app_name,
};
pub use mpris::MprisProvider;
pub use provider::MediaProvider;
pub use snapshot::{TrackSnapshot, thumbnail_data_uri};
pub use subscription::{Listener, Subscription};
pub use tracker::SessionTracker;
pub use types::{
    EventKind, NotificationKind, PlaybackStatus, ProviderNotification, RawSession, Thumbnail,
};

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::{MediaError, ProviderNotification, RawSession};

/// External source of truth for what is currently playing.
///
/// Implementations read the active session on demand and push change
/// notifications. Per-field read failures must already be degraded to
/// empty values inside `RawSession`; an `Err` from `current_session`
/// means the provider as a whole could not be queried.
#[async_trait]
pub trait MediaProvider: Send + Sync + 'static {
    /// Read the active session, or `None` when nothing is active.
    ///
    /// # Errors
    /// Returns error if the provider cannot be queried at all.
    async fn current_session(&self) -> Result<Option<RawSession>, MediaError>;

    /// Subscribe to change notifications.
    ///
    /// Dropping the stream ends the subscription.
    fn notifications(&self) -> BoxStream<'static, ProviderNotification>;
}

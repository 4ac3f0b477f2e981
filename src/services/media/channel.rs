use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

use super::{MediaError, MediaProvider, NotificationKind, ProviderNotification, RawSession};

/// In-process provider fed by the host application.
///
/// Whatever is published becomes the current session and is pushed to
/// every notification stream. Cloning shares the same state.
#[derive(Clone)]
pub struct ChannelProvider {
    session: Arc<Mutex<Option<RawSession>>>,
    notifications_tx: broadcast::Sender<ProviderNotification>,
}

impl ChannelProvider {
    /// Create a provider with no active session.
    pub fn new() -> Self {
        let (notifications_tx, _) = broadcast::channel(256);

        Self {
            session: Arc::new(Mutex::new(None)),
            notifications_tx,
        }
    }

    /// Replace the current session without notifying anyone.
    pub fn set_session(&self, session: Option<RawSession>) {
        let mut current = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        *current = session;
    }

    /// Replace the current session and notify subscribers.
    pub fn publish(&self, kind: NotificationKind, session: Option<RawSession>) {
        self.set_session(session.clone());
        let _ = self
            .notifications_tx
            .send(ProviderNotification { kind, session });
    }

    /// Number of live notification streams.
    pub fn subscriber_count(&self) -> usize {
        self.notifications_tx.receiver_count()
    }
}

impl Default for ChannelProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaProvider for ChannelProvider {
    async fn current_session(&self) -> Result<Option<RawSession>, MediaError> {
        let current = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(current.clone())
    }

    fn notifications(&self) -> BoxStream<'static, ProviderNotification> {
        BroadcastStream::new(self.notifications_tx.subscribe())
            .filter_map(|item| async move {
                match item {
                    Ok(notification) => Some(notification),
                    Err(e) => {
                        warn!("Dropped provider notifications: {e}");
                        None
                    }
                }
            })
            .boxed()
    }
}

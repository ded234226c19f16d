//! Per-recipient live delivery channel.
//!
//! Tracks which WebSocket connections belong to which user so the fanout
//! stage can push events to everyone currently attached. Delivery is
//! best-effort; a recipient with no live connection still has the event
//! durably recorded on their unread list.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

/// Unique identifier for one WebSocket subscription, used for precise
/// cleanup when a connection closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire shape of a live notification event.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent<'a> {
    pub event: &'a str,
    pub data: &'a str,
}

impl<'a> NotificationEvent<'a> {
    pub fn new_notification(text: &'a str) -> Self {
        Self {
            event: "newNotification",
            data: text,
        }
    }
}

struct Subscriber {
    id: SubscriberId,
    sender: UnboundedSender<String>,
}

/// Connection registry keyed by recipient identity.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    // user_id -> list of live subscribers
    inner: Arc<RwLock<HashMap<Uuid, Vec<Subscriber>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a connection for `user_id`.
    ///
    /// Returns the subscriber id (needed for detach) and the receiving end
    /// of the connection's channel.
    pub async fn attach(&self, user_id: Uuid) -> (SubscriberId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let subscriber_id = SubscriberId::new();

        let mut guard = self.inner.write().await;
        guard.entry(user_id).or_default().push(Subscriber {
            id: subscriber_id,
            sender: tx,
        });

        tracing::debug!(
            user_id = %user_id,
            subscribers = guard.get(&user_id).map(|v| v.len()).unwrap_or(0),
            "websocket subscriber attached"
        );

        (subscriber_id, rx)
    }

    /// Detach one subscriber of `user_id`. Must be called when the
    /// connection closes, otherwise the registry leaks senders.
    pub async fn detach(&self, user_id: Uuid, subscriber_id: SubscriberId) {
        let mut guard = self.inner.write().await;
        if let Some(subscribers) = guard.get_mut(&user_id) {
            subscribers.retain(|s| s.id != subscriber_id);
            if subscribers.is_empty() {
                guard.remove(&user_id);
            }
        }
    }

    /// Push a `newNotification` event to every live connection of
    /// `user_id`, pruning dead senders. Returns the number of connections
    /// that accepted the event.
    pub async fn push(&self, user_id: Uuid, text: &str) -> usize {
        let payload = match serde_json::to_string(&NotificationEvent::new_notification(text)) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("failed to serialize notification event: {e}");
                return 0;
            }
        };

        let mut guard = self.inner.write().await;
        let Some(subscribers) = guard.get_mut(&user_id) else {
            return 0;
        };

        subscribers.retain(|s| s.sender.send(payload.clone()).is_ok());
        let delivered = subscribers.len();
        if subscribers.is_empty() {
            guard.remove(&user_id);
        }
        delivered
    }

    /// Live connection count for a user (debugging/tests).
    pub async fn connection_count(&self, user_id: Uuid) -> usize {
        let guard = self.inner.read().await;
        guard.get(&user_id).map(|v| v.len()).unwrap_or(0)
    }
}

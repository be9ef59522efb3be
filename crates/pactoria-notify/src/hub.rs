//! Per-user broadcast channels.
//!
//! A user may hold several WebSocket connections; each subscribes to the
//! same channel. Publishing to a user nobody is listening for is a no-op.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use crate::events::WsEvent;

const DEFAULT_CAPACITY: usize = 64;

pub struct NotificationHub {
    channels: RwLock<HashMap<String, broadcast::Sender<WsEvent>>>,
    capacity: usize,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// `capacity` is the per-user backlog before slow receivers lag.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Open a receiver for `user_id`, creating the channel on first use.
    pub fn subscribe(&self, user_id: &str) -> broadcast::Receiver<WsEvent> {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = channels.get(user_id) {
            return tx.subscribe();
        }
        let (tx, rx) = broadcast::channel(self.capacity);
        channels.insert(user_id.to_string(), tx);
        tracing::debug!(user_id, "notification channel opened");
        rx
    }

    /// Send `event` to every live connection of `user_id`.
    ///
    /// Returns the number of receivers reached; 0 when the user has no
    /// connection, in which case the channel is dropped.
    pub fn publish(&self, user_id: &str, event: WsEvent) -> usize {
        let sent = {
            let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
            match channels.get(user_id) {
                Some(tx) => tx.send(event).ok(),
                None => return 0,
            }
        };
        if let Some(n) = sent {
            return n;
        }

        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        if channels.get(user_id).is_some_and(|tx| tx.receiver_count() == 0) {
            channels.remove(user_id);
            tracing::debug!(user_id, "notification channel closed");
        }
        0
    }

    /// Live receivers across all users.
    pub fn connection_count(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(broadcast::Sender::receiver_count)
            .sum()
    }

    /// Users with an open channel.
    pub fn user_count(&self) -> usize {
        self.channels.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn publish_without_listeners_is_zero() {
        let hub = NotificationHub::new();
        assert_eq!(hub.publish("usr-00000001", WsEvent::Pong), 0);
        assert_eq!(hub.user_count(), 0);
    }

    #[tokio::test]
    async fn every_connection_of_a_user_receives() {
        let hub = NotificationHub::new();
        let mut first = hub.subscribe("usr-00000001");
        let mut second = hub.subscribe("usr-00000001");
        let mut other = hub.subscribe("usr-00000002");
        assert_eq!(hub.connection_count(), 3);

        let reached = hub.publish("usr-00000001", WsEvent::UnreadCount { count: 2 });
        assert_eq!(reached, 2);
        assert_eq!(first.recv().await.unwrap(), WsEvent::UnreadCount { count: 2 });
        assert_eq!(second.recv().await.unwrap(), WsEvent::UnreadCount { count: 2 });
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let hub = NotificationHub::new();
        let rx = hub.subscribe("usr-00000001");
        assert_eq!(hub.user_count(), 1);
        drop(rx);
        assert_eq!(hub.connection_count(), 0);

        assert_eq!(hub.publish("usr-00000001", WsEvent::Pong), 0);
        assert_eq!(hub.user_count(), 0);

        let _rx = hub.subscribe("usr-00000001");
        assert_eq!(hub.publish("usr-00000001", WsEvent::Pong), 1);
    }
}

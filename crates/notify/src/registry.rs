//! Per-user connection registry
//!
//! Holds at most one live connection per authenticated user; a reconnect
//! replaces the previous entry without closing it explicitly. Delivery is
//! best-effort: offline users and full channels drop the event.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use campusloop_core::{Event, Notifier};

use crate::protocol::Message;

/// Registry of connected users, injected into the engines as the
/// [`Notifier`] implementation.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<Uuid, mpsc::Sender<Message>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user's connection. Last connection wins: an existing
    /// entry for the same user is silently replaced.
    pub fn register(&self, user_id: Uuid, tx: mpsc::Sender<Message>) {
        let previous = self.connections.lock().unwrap().insert(user_id, tx);
        if previous.is_some() {
            debug!(user_id = %user_id, "Replaced existing connection");
        }
    }

    /// Remove a user's connection on disconnect.
    ///
    /// Only evicts the entry if it still belongs to the disconnecting
    /// channel; a reconnect that already replaced it stays registered.
    pub fn unregister(&self, user_id: Uuid, tx: &mpsc::Sender<Message>) {
        let mut connections = self.connections.lock().unwrap();
        if let Some(current) = connections.get(&user_id) {
            if current.same_channel(tx) {
                connections.remove(&user_id);
            }
        }
    }

    /// Whether a user currently has a registered connection
    pub fn is_connected(&self, user_id: Uuid) -> bool {
        self.connections.lock().unwrap().contains_key(&user_id)
    }

    /// Number of registered connections
    pub fn connected_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }
}

impl Notifier for ConnectionRegistry {
    fn broadcast(&self, event: &Event) {
        let connections = self.connections.lock().unwrap();
        for (user_id, tx) in connections.iter() {
            let msg = Message::Event {
                event: event.clone(),
            };
            if tx.try_send(msg).is_err() {
                debug!(user_id = %user_id, "Failed to queue event for user");
            }
        }
    }

    fn notify_user(&self, user_id: Uuid, event: &Event) {
        let connections = self.connections.lock().unwrap();
        match connections.get(&user_id) {
            Some(tx) => {
                let msg = Message::Event {
                    event: event.clone(),
                };
                if tx.try_send(msg).is_err() {
                    debug!(user_id = %user_id, "Failed to queue event for user");
                }
            }
            None => {
                // Offline users miss the event; no queueing, no retry
                debug!(user_id = %user_id, "User offline, event dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> Event {
        Event::SlotDeleted {
            slot_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_connected() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);

        registry.register(Uuid::new_v4(), tx_a);
        registry.register(Uuid::new_v4(), tx_b);

        registry.broadcast(&event());

        assert!(matches!(rx_a.try_recv(), Ok(Message::Event { .. })));
        assert!(matches!(rx_b.try_recv(), Ok(Message::Event { .. })));
    }

    #[tokio::test]
    async fn test_direct_send_targets_one_user() {
        let registry = ConnectionRegistry::new();
        let target = Uuid::new_v4();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);

        registry.register(target, tx_a);
        registry.register(Uuid::new_v4(), tx_b);

        registry.notify_user(target, &event());

        assert!(matches!(rx_a.try_recv(), Ok(Message::Event { .. })));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_offline_user_dropped_silently() {
        let registry = ConnectionRegistry::new();
        // No connection registered; must not panic or error
        registry.notify_user(Uuid::new_v4(), &event());
    }

    #[tokio::test]
    async fn test_last_connection_wins() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();
        let (tx_old, mut rx_old) = mpsc::channel(8);
        let (tx_new, mut rx_new) = mpsc::channel(8);

        registry.register(user_id, tx_old);
        registry.register(user_id, tx_new);
        assert_eq!(registry.connected_count(), 1);

        registry.notify_user(user_id, &event());
        assert!(rx_old.try_recv().is_err());
        assert!(matches!(rx_new.try_recv(), Ok(Message::Event { .. })));
    }

    #[tokio::test]
    async fn test_stale_unregister_keeps_new_connection() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();
        let (tx_old, _rx_old) = mpsc::channel(8);
        let (tx_new, _rx_new) = mpsc::channel(8);

        registry.register(user_id, tx_old.clone());
        registry.register(user_id, tx_new);

        // The old connection's cleanup runs after the replacement
        registry.unregister(user_id, &tx_old);
        assert!(registry.is_connected(user_id));
    }
}

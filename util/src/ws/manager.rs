//! A thread-safe WebSocket manager for topic-based message broadcasting.
//!
//! Uses Tokio broadcast channels per topic. Display surfaces subscribe to a
//! session topic and receive every rotated token pushed by the scheduler.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

type Topic = String;
type Sender = broadcast::Sender<String>;
type Receiver = broadcast::Receiver<String>;

/// Manages broadcast channels per topic.
///
/// - Lazily creates broadcast channels per topic on first subscription
/// - Removes topics when their subscriber count drops to zero after sending
#[derive(Clone, Default)]
pub struct WebSocketManager {
    inner: Arc<RwLock<HashMap<Topic, Sender>>>,
}

impl WebSocketManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the given topic, creating it if necessary.
    pub async fn subscribe(&self, topic: &str) -> Receiver {
        let mut map = self.inner.write().await;
        map.entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(64).0)
            .subscribe()
    }

    /// Broadcasts a message to all subscribers of `topic`.
    ///
    /// No-op if nobody ever subscribed. A topic left without receivers is dropped.
    pub async fn broadcast<T: Into<String>>(&self, topic: &str, msg: T) {
        let mut map = self.inner.write().await;
        if let Some(sender) = map.get(topic) {
            let _ = sender.send(msg.into());
            if sender.receiver_count() == 0 {
                tracing::debug!(topic, "dropping topic without subscribers");
                map.remove(topic);
            }
        }
    }

    /// Number of live receivers on `topic`.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .read()
            .await
            .get(topic)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    pub async fn has_topic(&self, topic: &str) -> bool {
        self.inner.read().await.contains_key(topic)
    }
}

use axum::extract::ws::{Message, Utf8Bytes};
use bytes::Bytes;
use tokio::sync::mpsc;

/// Per-connection handle given to a [`WsHandler`](super::handler_trait::WsHandler).
///
/// Frames sent through it reach this client only; topic-wide pushes go
/// through [`emit`](crate::ws::emit).
pub struct WsContext {
    pub topic: String,
    out_tx: mpsc::Sender<Message>,
}

impl WsContext {
    pub fn new(topic: String, out_tx: mpsc::Sender<Message>) -> Self {
        Self { topic, out_tx }
    }

    /// Queues a text frame. `false` once the client is gone.
    pub async fn reply_text(&self, text: impl Into<Utf8Bytes>) -> bool {
        self.out_tx.send(Message::Text(text.into())).await.is_ok()
    }

    pub async fn reply_pong(&self, payload: Bytes) -> bool {
        self.out_tx.send(Message::Pong(payload)).await.is_ok()
    }
}

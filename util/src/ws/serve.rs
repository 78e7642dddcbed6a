use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::{sync::mpsc, time};

use super::WebSocketManager;
use super::handler_trait::WsHandler;
use super::runtime::WsContext;

pub struct WsServerOptions {
    pub ws_ping_sec: u64,
    pub enable_app_ping: bool,
}

impl Default for WsServerOptions {
    fn default() -> Self {
        Self {
            ws_ping_sec: 30,
            enable_app_ping: true,
        }
    }
}

/// Pumps one socket: topic broadcasts go out, parsed client frames go to `handler`.
///
/// Returns once the client closes or the connection drops.
pub async fn serve_topic<H: WsHandler>(
    socket: WebSocket,
    manager: WebSocketManager,
    topic: String,
    handler: Arc<H>,
    opts: WsServerOptions,
) {
    let mut rx = manager.subscribe(&topic).await;
    let (mut sink, mut socket_rx) = socket.split();

    let (out_tx, mut out_rx) = mpsc::channel::<Message>(64);
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    let ctx = WsContext::new(topic.clone(), out_tx.clone());

    let forward_task = {
        let out_tx = out_tx.clone();
        let topic = topic.clone();
        tokio::spawn(async move {
            while let Ok(msg) = rx.recv().await {
                if out_tx.send(Message::Text(msg.into())).await.is_err() {
                    tracing::debug!(%topic, "client gone while forwarding");
                    break;
                }
            }
        })
    };

    let ping_task = {
        let out_tx = out_tx.clone();
        let every = std::time::Duration::from_secs(opts.ws_ping_sec.max(1));
        tokio::spawn(async move {
            loop {
                time::sleep(every).await;
                if out_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        })
    };

    handler.on_open(&ctx).await;

    while let Some(Ok(msg)) = socket_rx.next().await {
        match msg {
            Message::Text(text) => {
                let raw = text.as_str();
                if opts.enable_app_ping && is_app_ping(raw) {
                    let _ = ctx
                        .reply_text(
                            serde_json::json!({
                                "event": "pong",
                                "topic": ctx.topic,
                                "payload": {},
                                "ts": Utc::now().to_rfc3339(),
                            })
                            .to_string(),
                        )
                        .await;
                    continue;
                }
                match serde_json::from_str::<H::In>(raw) {
                    Ok(parsed) => handler.on_message(&ctx, parsed).await,
                    Err(e) => tracing::warn!(topic = %ctx.topic, error = %e, "invalid ws message"),
                }
            }
            Message::Ping(payload) => {
                let _ = ctx.reply_pong(payload).await;
            }
            Message::Pong(_) => {}
            Message::Binary(_) => {
                tracing::warn!(topic = %ctx.topic, "ignoring binary frame");
            }
            Message::Close(_) => break,
        }
    }

    handler.on_close(&ctx).await;
    forward_task.abort();
    ping_task.abort();
    drop(ctx);
    drop(out_tx);
    let _ = writer_task.await;
    tracing::info!(%topic, "ws session ended");
}

fn is_app_ping(raw: &str) -> bool {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        if let Some(Value::String(t)) = map.get("type") {
            return t == "ping";
        }
    }
    false
}

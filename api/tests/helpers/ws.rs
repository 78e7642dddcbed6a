use axum::Router;
use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, client::IntoClientRequest},
};
use url::Url;

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Spawns the router on a random local port.
pub async fn spawn_server(app: Router) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// Connects to `/ws/{path}`, passing the JWT as `?token=` when given.
pub async fn connect_ws(
    addr: &str,
    path: &str,
    token: Option<&str>,
) -> Result<
    (Client, axum::http::Response<Option<Vec<u8>>>),
    tokio_tungstenite::tungstenite::Error,
> {
    let url = match token {
        Some(t) => format!("ws://{addr}/ws/{path}?token={t}"),
        None => format!("ws://{addr}/ws/{path}"),
    };
    let req = Url::parse(&url).unwrap().to_string().into_client_request().unwrap();
    connect_async(req).await
}

/// Next text frame as JSON, skipping transport pings.
pub async fn next_json(ws: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

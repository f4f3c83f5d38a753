use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};

/// A WebSocket echo server: whatever text/binary frame a client sends is
/// sent straight back, so a scripted `WsStep::Send` round-trip can be
/// asserted against without a real upstream service.
pub struct MockWsServer {
    pub addr: std::net::SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl MockWsServer {
    pub async fn start() -> Self {
        let app = Router::new().route("/ws", get(upgrade));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock ws server exited");
        });
        Self { addr, handle }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn upgrade(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(echo_loop)
}

async fn echo_loop(socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(_) | Message::Binary(_) => {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

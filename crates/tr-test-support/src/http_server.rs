use axum::routing::{get, post};
use axum::{Json, Router};

/// A minimal in-process HTTP server for transport tests — no network
/// dependency, no testcontainers image to pull. Binds to an ephemeral
/// port on `127.0.0.1` and serves until the returned `JoinHandle` is
/// aborted or the process exits.
pub struct MockHttpServer {
    pub addr: std::net::SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl MockHttpServer {
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/echo", post(echo))
            .route("/health", get(health))
            .route("/slow", get(slow));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server exited");
        });

        Self { addr, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for MockHttpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn echo(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
    Json(body)
}

async fn slow() -> &'static str {
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    "done"
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("grpc status: {0}")]
    Grpc(#[from] tonic::Status),
    #[error("grpc transport: {0}")]
    GrpcTransport(#[from] tonic::transport::Error),
    #[error("grpc descriptor: {0}")]
    Descriptor(String),
    #[error("invalid request message: {0}")]
    InvalidMessage(String),
    #[error("sse: {0}")]
    Sse(String),
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("unsupported: {0}")]
    Unsupported(String),
}

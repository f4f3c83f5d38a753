use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use chrono::Utc;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tr_document::{PhaseKind, PhaseMeta, Response, ResponseKind, WebSocketSpec, WsStep};
use tr_stream::{Direction, StreamSession};
use tr_trace::Recorder;

use crate::common::{validate_headers, ExecRequest};
use crate::error::TransportError;

type WsStreamType = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A handle for sending further frames on an open connection after the
/// scripted `steps` have run, so a pre-request/test script can drive the
/// socket interactively (spec §4.7's stream bindings).
#[derive(Clone)]
pub struct WsHandle {
    sink: Arc<Mutex<SplitSink<WsStreamType, WsMessage>>>,
}

impl WsHandle {
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.sink.lock().await.send(WsMessage::Text(text.into().into())).await?;
        Ok(())
    }

    pub async fn send_binary(&self, data: Vec<u8>) -> Result<(), TransportError> {
        self.sink.lock().await.send(WsMessage::Binary(data.into())).await?;
        Ok(())
    }

    pub async fn close(&self, code: u16, reason: String) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .send(WsMessage::Close(Some(tokio_tungstenite::tungstenite::protocol::CloseFrame {
                code: tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode::from(code),
                reason: reason.into(),
            })))
            .await?;
        Ok(())
    }
}

pub struct WsExecutor;

impl WsExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Connects, negotiates subprotocols, spawns a background task that
    /// republishes every inbound frame onto `session`, then plays back the
    /// document's scripted `steps` in order. Returns the response summary
    /// plus a [`WsHandle`] so later script steps can keep sending.
    pub async fn execute(
        &self,
        req: &ExecRequest,
        spec: &WebSocketSpec,
        session: Arc<StreamSession>,
        recorder: &mut Recorder,
    ) -> Result<(Response, WsHandle), TransportError> {
        validate_headers(&req.headers)?;

        let start = Utc::now();
        recorder.start(PhaseKind::Connect, start);

        let mut request = req.url.clone().into_client_request()?;
        for (name, value) in &req.headers {
            request.headers_mut().insert(
                http::HeaderName::try_from(name.as_str())
                    .map_err(|e| TransportError::InvalidHeader { name: name.clone(), reason: e.to_string() })?,
                http::HeaderValue::from_str(value)
                    .map_err(|e| TransportError::InvalidHeader { name: name.clone(), reason: e.to_string() })?,
            );
        }
        if !spec.subprotocols.is_empty() {
            request.headers_mut().insert(
                http::header::SEC_WEBSOCKET_PROTOCOL,
                http::HeaderValue::from_str(&spec.subprotocols.join(", "))
                    .map_err(|e| TransportError::InvalidHeader { name: "sec-websocket-protocol".to_string(), reason: e.to_string() })?,
            );
        }

        let (ws_stream, handshake) = connect_async(request).await?;
        recorder.end(PhaseKind::Connect, Utc::now(), PhaseMeta::default(), None);

        let negotiated_protocol = handshake
            .headers()
            .get(http::header::SEC_WEBSOCKET_PROTOCOL)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        session.mark_open(serde_json::json!({ "subprotocol": negotiated_protocol }));

        let (sink, mut stream) = ws_stream.split();
        let sink = Arc::new(Mutex::new(sink));
        let handle = WsHandle { sink: Arc::clone(&sink) };

        let reader_session = Arc::clone(&session);
        tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(WsMessage::Text(text)) => {
                        reader_session.publish(Direction::Inbound, serde_json::json!({ "text": text.to_string() }));
                    }
                    Ok(WsMessage::Binary(data)) => {
                        let encoded = base64::engine::general_purpose::STANDARD.encode(&data);
                        reader_session.publish(Direction::Inbound, serde_json::json!({ "binary_base64": encoded }));
                    }
                    Ok(WsMessage::Close(frame)) => {
                        reader_session.close(
                            frame.as_ref().map(|f| f.code.into()),
                            frame.map(|f| f.reason.to_string()),
                        );
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        reader_session.close(None, Some(err.to_string()));
                        break;
                    }
                }
            }
        });

        for step in &spec.steps {
            run_step(step, &sink, &session).await?;
        }

        let end = Utc::now();
        Ok((
            Response {
                kind: ResponseKind::WebSocket,
                status_code: 101,
                status_text: "Switching Protocols".to_string(),
                headers: tr_document::HeaderMultiMap::new(),
                trailers: tr_document::HeaderMultiMap::new(),
                content_type: None,
                wire_content_type: None,
                body: Vec::new(),
                wire: None,
                duration: (end - start).to_std().unwrap_or_default(),
                url: req.url.clone(),
                error: None,
            },
            handle,
        ))
    }
}

impl Default for WsExecutor {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_step(
    step: &WsStep,
    sink: &Arc<Mutex<SplitSink<WsStreamType, WsMessage>>>,
    session: &Arc<StreamSession>,
) -> Result<(), TransportError> {
    let mut guard = sink.lock().await;
    match step {
        WsStep::Send(text) => {
            guard.send(WsMessage::Text(text.clone().into())).await?;
            session.publish(Direction::Outbound, serde_json::json!({ "text": text }));
        }
        WsStep::SendJson(value) => {
            let text = value.to_string();
            guard.send(WsMessage::Text(text.clone().into())).await?;
            session.publish(Direction::Outbound, serde_json::json!({ "json": value }));
        }
        WsStep::SendBase64(encoded) => {
            let data = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| TransportError::InvalidMessage(e.to_string()))?;
            guard.send(WsMessage::Binary(data.clone().into())).await?;
            session.publish(Direction::Outbound, serde_json::json!({ "binary_base64": encoded }));
        }
        WsStep::SendFile(path) => {
            let data = tokio::fs::read(path)
                .await
                .map_err(|e| TransportError::InvalidMessage(format!("{path}: {e}")))?;
            guard.send(WsMessage::Binary(data.into())).await?;
            session.publish(Direction::Outbound, serde_json::json!({ "file": path }));
        }
        WsStep::Ping => {
            guard.send(WsMessage::Ping(Vec::new().into())).await?;
        }
        WsStep::Pong => {
            guard.send(WsMessage::Pong(Vec::new().into())).await?;
        }
        WsStep::Wait(duration) => {
            drop(guard);
            tokio::time::sleep(*duration).await;
        }
        WsStep::Close { code, reason } => {
            guard
                .send(WsMessage::Close(Some(tokio_tungstenite::tungstenite::protocol::CloseFrame {
                    code: tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode::from(*code),
                    reason: reason.clone().into(),
                })))
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_step_variant_carries_duration() {
        let step = WsStep::Wait(Duration::from_millis(5));
        assert!(matches!(step, WsStep::Wait(d) if d == Duration::from_millis(5)));
    }
}

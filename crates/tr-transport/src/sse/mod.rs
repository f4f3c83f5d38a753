use std::sync::Arc;

use chrono::Utc;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use tr_document::{PhaseKind, PhaseMeta, Response, ResponseKind, SseSpec};
use tr_stream::{Direction, StreamSession};
use tr_trace::Recorder;

use crate::common::{validate_headers, ExecRequest};
use crate::error::TransportError;

/// Executes a Server-Sent Events subscription (spec §4.5.3): connects,
/// republishes every event onto a `StreamSession`, and automatically
/// reconnects up to `spec.max_reconnects` times using the last-seen event id
/// (either the server's `retry:` field or a flat backoff when none is sent).
pub struct SseExecutor {
    client: reqwest::Client,
}

impl SseExecutor {
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
        })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Runs the subscription to completion (stream ends, or reconnects are
    /// exhausted), publishing every event to `session` as it arrives.
    /// Returns a `Response` summarizing the exchange, mirroring the shape
    /// the other executors return so `tr-orchestrator` can treat them
    /// uniformly for capture/assert purposes.
    pub async fn execute(
        &self,
        req: &ExecRequest,
        spec: &SseSpec,
        session: Arc<StreamSession>,
        recorder: &mut Recorder,
    ) -> Result<Response, TransportError> {
        validate_headers(&req.headers)?;

        let start = Utc::now();
        recorder.start(PhaseKind::Transfer, start);

        let mut last_event_id = spec.last_event_id.clone();
        let mut reconnects = 0u32;
        let mut event_count = 0u64;
        let mut last_error = None;

        loop {
            let mut builder = self
                .client
                .get(&req.url)
                .header("Accept", "text/event-stream");
            for (name, value) in &req.headers {
                builder = builder.header(name, value);
            }
            if let Some(id) = &last_event_id {
                builder = builder.header("Last-Event-ID", id);
            }

            let response = match builder.send().await {
                Ok(r) => r,
                Err(err) => {
                    last_error = Some(err.to_string());
                    break;
                }
            };
            session.mark_open(serde_json::json!({ "status": response.status().as_u16() }));

            let mut stream = response.bytes_stream().eventsource();
            let mut disconnected_cleanly = true;
            while let Some(item) = stream.next().await {
                match item {
                    Ok(event) => {
                        if !event.id.is_empty() {
                            last_event_id = Some(event.id.clone());
                        }
                        event_count += 1;
                        session.publish(
                            Direction::Inbound,
                            serde_json::json!({
                                "event": event.event,
                                "data": event.data,
                                "id": event.id,
                            }),
                        );
                    }
                    Err(err) => {
                        disconnected_cleanly = false;
                        last_error = Some(err.to_string());
                        break;
                    }
                }
            }

            if disconnected_cleanly || reconnects >= spec.max_reconnects {
                break;
            }
            reconnects += 1;
        }

        let end = Utc::now();
        recorder.end(
            PhaseKind::Transfer,
            end,
            PhaseMeta::default(),
            last_error.clone(),
        );
        session.close(None, last_error.clone());

        Ok(Response {
            kind: ResponseKind::Sse,
            status_code: 0,
            status_text: String::new(),
            headers: tr_document::HeaderMultiMap::new(),
            trailers: tr_document::HeaderMultiMap::new(),
            content_type: Some("text/event-stream".to_string()),
            wire_content_type: None,
            body: serde_json::json!({ "events_received": event_count }).to_string().into_bytes(),
            wire: None,
            duration: (end - start).to_std().unwrap_or_default(),
            url: req.url.clone(),
            error: last_error,
        })
    }
}

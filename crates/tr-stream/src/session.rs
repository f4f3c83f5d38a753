use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// One item pushed through a stream session: a WebSocket frame, an SSE
/// event, or a gRPC streaming message, normalized to the same envelope so
/// `tr-orchestrator` and scripts can observe any of them identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMessage {
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub direction: Direction,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// What a subscriber receives: either a live message or the terminal close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    Message(StreamMessage),
    Closed { code: Option<u16>, reason: Option<String> },
}

const DEFAULT_REPLAY_CAPACITY: usize = 256;
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A single open stream (one WebSocket connection, one SSE subscription, one
/// gRPC stream), identified by `id`. Mirrors the teacher's `UiLogger`:
/// a broadcast sender for live fan-out plus a bounded ring buffer so a late
/// subscriber can replay what it missed, trimming to capacity by dropping
/// the oldest entry rather than blocking the publisher (spec §4.3).
pub struct StreamSession {
    pub id: Uuid,
    tx: broadcast::Sender<StreamEvent>,
    replay: Arc<RwLock<VecDeque<StreamMessage>>>,
    replay_capacity: usize,
    context: Arc<RwLock<serde_json::Value>>,
    next_seq: Arc<std::sync::atomic::AtomicU64>,
    closed: Arc<std::sync::atomic::AtomicBool>,
}

impl StreamSession {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY, DEFAULT_REPLAY_CAPACITY)
    }

    pub fn with_capacity(channel_capacity: usize, replay_capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(channel_capacity.max(1));
        Self {
            id: Uuid::new_v4(),
            tx,
            replay: Arc::new(RwLock::new(VecDeque::new())),
            replay_capacity,
            context: Arc::new(RwLock::new(serde_json::Value::Null)),
            next_seq: Arc::new(std::sync::atomic::AtomicU64::new(0)),
            closed: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    /// Records the connection-level context (negotiated subprotocol, initial
    /// SSE `last_event_id`, gRPC call metadata) made visible to scripts and
    /// the recorded trace once the underlying transport completes its
    /// handshake. Overwrites any previous context.
    pub fn mark_open(&self, context: serde_json::Value) {
        *self.context.write().expect("context lock poisoned") = context;
    }

    pub fn context(&self) -> serde_json::Value {
        self.context.read().expect("context lock poisoned").clone()
    }

    /// Publishes one message. Subscribers with a full channel queue simply
    /// miss the live broadcast (tokio's broadcast channel lags them instead
    /// of blocking the publisher); the replay buffer is what lets a
    /// subscriber that joins late, or that lagged, catch back up.
    pub fn publish(&self, direction: Direction, payload: serde_json::Value) -> StreamMessage {
        let seq = self.next_seq.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let msg = StreamMessage {
            seq,
            at: Utc::now(),
            direction,
            payload,
        };

        {
            let mut buf = self.replay.write().expect("replay lock poisoned");
            if buf.len() >= self.replay_capacity {
                buf.pop_front();
            }
            buf.push_back(msg.clone());
        }

        let _ = self.tx.send(StreamEvent::Message(msg.clone()));
        msg
    }

    /// Subscribes for live events, seeded with whatever is still in the
    /// replay buffer so the subscriber doesn't need a separate history call.
    pub fn subscribe(&self) -> (Vec<StreamMessage>, broadcast::Receiver<StreamEvent>) {
        let replay = self.replay.read().expect("replay lock poisoned").iter().cloned().collect();
        (replay, self.tx.subscribe())
    }

    pub fn close(&self, code: Option<u16>, reason: Option<String>) {
        self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
        let _ = self.tx.send(StreamEvent::Closed { code, reason });
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn replayed(&self) -> Vec<StreamMessage> {
        self.replay.read().expect("replay lock poisoned").iter().cloned().collect()
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_replays_buffered_messages_before_going_live() {
        let session = StreamSession::new();
        session.publish(Direction::Inbound, serde_json::json!({"n": 1}));
        session.publish(Direction::Inbound, serde_json::json!({"n": 2}));

        let (replay, _rx) = session.subscribe();
        assert_eq!(replay.len(), 2);
        assert_eq!(replay[0].seq, 0);
        assert_eq!(replay[1].seq, 1);
    }

    #[test]
    fn replay_buffer_drops_oldest_once_over_capacity() {
        let session = StreamSession::with_capacity(16, 2);
        session.publish(Direction::Outbound, serde_json::json!(1));
        session.publish(Direction::Outbound, serde_json::json!(2));
        session.publish(Direction::Outbound, serde_json::json!(3));

        let replayed = session.replayed();
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].payload, serde_json::json!(2));
        assert_eq!(replayed[1].payload, serde_json::json!(3));
    }

    #[tokio::test]
    async fn subscribers_receive_live_publishes_after_subscribing() {
        let session = StreamSession::new();
        let (_replay, mut rx) = session.subscribe();
        session.publish(Direction::Inbound, serde_json::json!("hello"));

        match rx.recv().await.unwrap() {
            StreamEvent::Message(msg) => assert_eq!(msg.payload, serde_json::json!("hello")),
            other => panic!("expected a message event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_broadcasts_a_closed_event_and_flips_is_closed() {
        let session = StreamSession::new();
        let (_replay, mut rx) = session.subscribe();
        session.close(Some(1000), Some("done".to_string()));

        assert!(session.is_closed());
        match rx.recv().await.unwrap() {
            StreamEvent::Closed { code, reason } => {
                assert_eq!(code, Some(1000));
                assert_eq!(reason.as_deref(), Some("done"));
            }
            other => panic!("expected a closed event, got {other:?}"),
        }
    }

    #[test]
    fn mark_open_records_context_for_later_inspection() {
        let session = StreamSession::new();
        session.mark_open(serde_json::json!({"subprotocol": "chat"}));
        assert_eq!(session.context()["subprotocol"], "chat");
    }
}

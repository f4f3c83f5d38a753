//! Stream Session (spec §4.3): pub/sub plumbing shared by the WebSocket,
//! SSE, and gRPC-streaming transports, grounded on the same broadcast +
//! bounded ring-buffer shape the race-timer UI log uses for fan-out.

mod registry;
mod session;

pub use registry::StreamRegistry;
pub use session::{Direction, StreamEvent, StreamMessage, StreamSession};

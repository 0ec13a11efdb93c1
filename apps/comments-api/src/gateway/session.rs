//! Per-connection viewer state.

use std::time::Instant;

/// State for a single viewer WebSocket.
pub struct ViewerSession {
    /// Hub channel id (`vwr_` prefixed ULID).
    pub viewer_id: String,
    pub connected_at: Instant,
    /// Dispatches sent on this connection so far.
    seq: u64,
}

impl ViewerSession {
    pub fn new(viewer_id: String) -> Self {
        Self {
            viewer_id,
            connected_at: Instant::now(),
            seq: 0,
        }
    }

    /// Next dispatch sequence number, starting at 1.
    pub fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

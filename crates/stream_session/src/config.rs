use std::ops::RangeInclusive;
use std::time::Duration;

/// Timing and bounds shared by the streaming handlers.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a bidirectional session stays open before the server
    /// completes it.
    pub bidi_window: Duration,

    /// Delay between consecutive server-streamed messages.
    pub server_stream_pacing: Duration,

    /// Allowed number of server-streamed messages. Requests outside the range
    /// are clamped into it.
    pub server_stream_bounds: RangeInclusive<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bidi_window: Duration::from_secs(2),
            server_stream_pacing: Duration::from_millis(500),
            server_stream_bounds: 1..=5,
        }
    }
}

impl SessionConfig {
    /// Set the bidirectional session window.
    pub fn with_bidi_window(mut self, window: Duration) -> Self {
        self.bidi_window = window;
        self
    }

    /// Set the server-streaming pacing delay.
    pub fn with_server_stream_pacing(mut self, pacing: Duration) -> Self {
        self.server_stream_pacing = pacing;
        self
    }

    /// Set the server-streaming message bounds.
    pub fn with_server_stream_bounds(mut self, bounds: RangeInclusive<u32>) -> Self {
        self.server_stream_bounds = bounds;
        self
    }

    /// Clamp a requested message count into the configured bounds.
    pub fn clamp_count(&self, requested: i32) -> u32 {
        let min = *self.server_stream_bounds.start();
        let max = (*self.server_stream_bounds.end()).max(min);
        u32::try_from(requested).unwrap_or(0).clamp(min, max)
    }
}

//! Inbound-traffic clock backing the heartbeat timeout.
//!
//! Any frame from the server counts as liveness; a silent window longer
//! than the configured timeout is treated as a transport failure, not a
//! protocol error.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct LivenessClock {
    last_seen: Instant,
    window: Duration,
}

impl LivenessClock {
    pub fn new(window: Duration) -> Self {
        Self {
            last_seen: Instant::now(),
            window,
        }
    }

    /// Record inbound traffic.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Whether the silence window has elapsed.
    pub fn expired(&self) -> bool {
        self.last_seen.elapsed() >= self.window
    }

    pub fn since_last_seen(&self) -> Duration {
        self.last_seen.elapsed()
    }
}

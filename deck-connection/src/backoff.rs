//! Reconnect delay schedule.
//!
//! Attempts are unlimited. The delay starts at the configured initial value,
//! doubles after every attempt that did not complete a handshake, and is
//! capped at the configured maximum. A completed handshake resets it.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial.min(max),
        }
    }

    /// Delay to wait before the next attempt; advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial.min(self.max);
    }
}

//! Exponential backoff between dial retries.

use std::time::Duration;

/// Upper bound for a single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Doubling delay sequence capped at [`MAX_BACKOFF`].
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
}

impl Backoff {
    pub fn new(initial: Duration) -> Self {
        Self {
            next: initial.min(MAX_BACKOFF),
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(MAX_BACKOFF);
        delay
    }
}

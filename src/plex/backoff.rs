use std::time::Duration;

/// Base delay before the first reconnect attempt.
const BACKOFF_BASE_MS: u64 = 1_000;

/// Doublings applied before the delay stops growing (1s, 2s, 4s, 8s).
const MAX_DOUBLINGS: u32 = 3;

/// Exponential reconnect delay for the notification stream.
#[derive(Debug, Default)]
pub(crate) struct Backoff {
    attempt: u32,
}

impl Backoff {
    pub(crate) fn new() -> Self {
        Self { attempt: 0 }
    }

    pub(crate) fn next(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        let delay = BACKOFF_BASE_MS * 2u64.pow((self.attempt - 1).min(MAX_DOUBLINGS));
        Duration::from_millis(delay)
    }

    pub(crate) fn attempt(&self) -> u32 {
        self.attempt
    }

    pub(crate) fn reset(&mut self) {
        self.attempt = 0;
    }
}

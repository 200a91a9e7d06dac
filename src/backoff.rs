/// Reconnect backoff policy
///
/// The delay starts at a fixed base, multiplies by a fixed factor after
/// every consecutive failed cycle, and is capped at a ceiling. Any
/// successful connection resets the delay to the base.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    factor: f64,
    max: Duration,
    consecutive_failures: u32,
}

impl Backoff {
    pub fn new(base: Duration, factor: f64, max: Duration) -> Self {
        Self {
            base,
            factor,
            max,
            consecutive_failures: 0,
        }
    }

    /// Delay to wait before the next attempt, advancing the failure count.
    /// Called once per failed cycle: the Nth call returns
    /// `min(base * factor^(N-1), max)`.
    pub fn next_delay(&mut self) -> Duration {
        let scaled = self.base.as_millis() as f64
            * self.factor.powi(self.consecutive_failures as i32);
        let capped = scaled.min(self.max.as_millis() as f64);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        Duration::from_millis(capped as u64)
    }

    /// Reset to the base delay. Called on every successful connection.
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

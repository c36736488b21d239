use crate::types::RECONNECT_JITTER_MS;
use rand::Rng;
use std::time::Duration;

/// Timer for reconnection logic with exponential backoff and jitter
#[derive(Debug, Clone)]
pub struct ReconnectTimer {
    attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl ReconnectTimer {
    pub fn new(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            attempts: 0,
            base_delay_ms,
            max_delay_ms,
        }
    }

    /// Number of reconnects scheduled since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before jitter for the given attempt (1-based):
    /// `min(base * 2^(attempt - 1), max)`
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let delay = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }

    /// Counts a new attempt and returns its delay including jitter
    pub fn next_delay(&mut self) -> Duration {
        self.attempts = self.attempts.saturating_add(1);
        let jitter = rand::rng().random_range(0..RECONNECT_JITTER_MS);
        self.base_delay(self.attempts) + Duration::from_millis(jitter)
    }

    /// Reset the timer
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

/// Whole seconds for display, rounded to nearest
pub fn rounded_secs(delay: Duration) -> u64 {
    (delay.as_millis() as f64 / 1000.0).round() as u64
}

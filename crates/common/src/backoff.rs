use rand::Rng;
use std::time::Duration;

/// Exponential backoff with optional jitter for polling and retry loops.
///
/// Formula: min(max_delay, base * 2^attempt) +/- jitter
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    max_delay: Duration,
    jitter_factor: f64,
    attempt: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60))
    }
}

impl ExponentialBackoff {
    /// Create a backoff without jitter.
    ///
    /// `max_delay` below `base` is raised to `base`, so the first delay is
    /// always exactly `base`.
    pub fn new(base: Duration, max_delay: Duration) -> Self {
        Self {
            base,
            max_delay: max_delay.max(base),
            jitter_factor: 0.0,
            attempt: 0,
        }
    }

    /// A backoff that never grows: every delay equals `delay`.
    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, delay)
    }

    /// Add jitter as a fraction of the delay (0.0 to 1.0). Negative values are clamped to 0.
    pub fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor.clamp(0.0, 1.0);
        self
    }

    /// Delay for the current attempt, without jitter and without advancing.
    pub fn peek_delay(&self) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(self.attempt))
            .min(self.max_delay)
    }

    /// Calculate the next delay and increment the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let capped_delay = self.peek_delay();

        let jitter_range = capped_delay.as_secs_f64() * self.jitter_factor;
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };
        let final_secs = (capped_delay.as_secs_f64() + jitter).max(0.0);

        self.attempt = self.attempt.saturating_add(1);

        Duration::from_secs_f64(final_secs)
    }

    /// Reset the attempt counter (call after a successful request).
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Get current attempt number.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

//! Executor timing configuration.
//!
//! Every wait in the trade flow is bounded by one of these policies. The
//! defaults reproduce the pacing the bot has always used against Binance:
//! one second between polls, ten seconds after a failed visibility check,
//! twenty attempts around each trade.

use std::time::Duration;

use execution_core::ExchangeError;

/// How the submitter reacts to failed order placements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitPolicy {
    /// Wait after the exchange rejected the order.
    pub rejected_delay: Duration,

    /// Wait after any other failure (network, parsing, ...).
    pub unexpected_delay: Duration,

    /// Placement attempts before giving up. `None` resubmits until the
    /// exchange accepts the order or the executor is cancelled.
    pub max_attempts: Option<u32>,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            rejected_delay: Duration::from_secs(1),
            unexpected_delay: Duration::ZERO,
            max_attempts: Some(10),
        }
    }
}

impl SubmitPolicy {
    /// Resubmit without an attempt limit.
    pub fn unbounded(mut self) -> Self {
        self.max_attempts = None;
        self
    }

    /// Builder method to set the attempt limit (at least one).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    /// Delay before resubmitting after `error`.
    pub fn delay_for(&self, error: &ExchangeError) -> Duration {
        if error.is_rejected() {
            self.rejected_delay
        } else {
            self.unexpected_delay
        }
    }

    /// True once `attempts` placements have been made without success.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Pacing and deadline of one polling phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before the first query.
    pub settle_delay: Duration,

    /// Wait between successful queries that did not end the phase.
    pub interval: Duration,

    /// First wait after a failed query; doubles on consecutive failures.
    pub error_delay: Duration,

    /// Ceiling for the doubled error wait.
    pub max_error_delay: Duration,

    /// Total time the phase may take, settle delay included.
    pub timeout: Duration,
}

impl PollPolicy {
    /// Waiting for a freshly placed order to show up in order queries.
    pub fn visibility(settle_delay: Duration) -> Self {
        Self {
            settle_delay,
            interval: Duration::from_secs(1),
            error_delay: Duration::from_secs(10),
            max_error_delay: Duration::from_secs(60),
            timeout: Duration::from_secs(5 * 60),
        }
    }

    /// Waiting for a visible order to reach `FILLED`.
    pub fn fill() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            interval: Duration::from_secs(1),
            error_delay: Duration::from_secs(2),
            max_error_delay: Duration::from_secs(30),
            timeout: Duration::from_secs(30 * 60),
        }
    }

    /// Waiting for the account balance to reflect a filled sell.
    pub fn balance_settlement() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            interval: Duration::from_secs(1),
            error_delay: Duration::from_secs(2),
            max_error_delay: Duration::from_secs(30),
            timeout: Duration::from_secs(5 * 60),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_error_delay(mut self, base: Duration, max: Duration) -> Self {
        self.error_delay = base;
        self.max_error_delay = max;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Outer retry around a whole trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Trade attempts before the trade is reported as not confirmed.
    pub max_attempts: u32,

    /// Wait before the first attempt.
    pub initial_delay: Duration,

    /// Wait between a failed attempt and the next one.
    pub between_attempts: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            initial_delay: Duration::from_secs(1),
            between_attempts: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Builder method to set the attempt budget (at least one).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_between_attempts(mut self, delay: Duration) -> Self {
        self.between_attempts = delay;
        self
    }
}

/// Configuration for the trade executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub submit: SubmitPolicy,

    /// Visibility phase after a limit buy.
    pub buy_visibility: PollPolicy,

    /// Visibility phase after a market sell. The exchange needs longer to
    /// report market orders, hence the longer settle delay.
    pub sell_visibility: PollPolicy,

    pub fill: PollPolicy,

    /// Post-fill wait for the origin balance of a sell to drop.
    pub balance_settlement: PollPolicy,

    pub retry: RetryPolicy,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            submit: SubmitPolicy::default(),
            buy_visibility: PollPolicy::visibility(Duration::from_secs(3)),
            sell_visibility: PollPolicy::visibility(Duration::from_secs(8)),
            fill: PollPolicy::fill(),
            balance_settlement: PollPolicy::balance_settlement(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ExecutorConfig {
    /// Create a new config with all default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submit(mut self, submit: SubmitPolicy) -> Self {
        self.submit = submit;
        self
    }

    pub fn with_buy_visibility(mut self, policy: PollPolicy) -> Self {
        self.buy_visibility = policy;
        self
    }

    pub fn with_sell_visibility(mut self, policy: PollPolicy) -> Self {
        self.sell_visibility = policy;
        self
    }

    pub fn with_fill_poll(mut self, policy: PollPolicy) -> Self {
        self.fill = policy;
        self
    }

    pub fn with_balance_settlement(mut self, policy: PollPolicy) -> Self {
        self.balance_settlement = policy;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pacing() {
        let config = ExecutorConfig::default();

        assert_eq!(config.buy_visibility.settle_delay, Duration::from_secs(3));
        assert_eq!(config.sell_visibility.settle_delay, Duration::from_secs(8));
        assert_eq!(config.buy_visibility.error_delay, Duration::from_secs(10));
        assert_eq!(config.fill.interval, Duration::from_secs(1));
        assert_eq!(config.fill.error_delay, Duration::from_secs(2));
        assert_eq!(config.retry.max_attempts, 20);
        assert_eq!(config.retry.initial_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_submit_delay_by_error_kind() {
        let policy = SubmitPolicy::default();

        assert_eq!(
            policy.delay_for(&ExchangeError::rejected(-1013, "Filter failure: PRICE_FILTER")),
            Duration::from_secs(1)
        );
        assert_eq!(
            policy.delay_for(&ExchangeError::unexpected("connection reset")),
            Duration::ZERO
        );
    }

    #[test]
    fn test_submit_exhaustion() {
        let bounded = SubmitPolicy::default().with_max_attempts(3);
        assert!(!bounded.is_exhausted(2));
        assert!(bounded.is_exhausted(3));

        let unbounded = SubmitPolicy::default().unbounded();
        assert!(!unbounded.is_exhausted(u32::MAX));

        assert_eq!(SubmitPolicy::default().with_max_attempts(0).max_attempts, Some(1));
    }

    #[test]
    fn test_builders() {
        let config = ExecutorConfig::new()
            .with_fill_poll(PollPolicy::fill().with_timeout(Duration::from_secs(60)))
            .with_retry(RetryPolicy::default().with_max_attempts(0));

        assert_eq!(config.fill.timeout, Duration::from_secs(60));
        assert_eq!(config.retry.max_attempts, 1);
    }
}

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe counters for the trade executor.
#[derive(Debug)]
pub struct ExecutionMetrics {
    // Trades
    trade_attempts: AtomicU64,
    trades_filled: AtomicU64,
    trades_exhausted: AtomicU64,

    // Order placement
    submissions: AtomicU64,
    submission_rejects: AtomicU64,
    submission_errors: AtomicU64,

    // Confirmation polling
    order_queries: AtomicU64,
    query_errors: AtomicU64,
    balance_polls: AtomicU64,
    poll_timeouts: AtomicU64,

    inner: RwLock<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    start_time: Instant,
    last_fill_time: Option<Instant>,
    last_error_time: Option<Instant>,
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            trade_attempts: AtomicU64::new(0),
            trades_filled: AtomicU64::new(0),
            trades_exhausted: AtomicU64::new(0),
            submissions: AtomicU64::new(0),
            submission_rejects: AtomicU64::new(0),
            submission_errors: AtomicU64::new(0),
            order_queries: AtomicU64::new(0),
            query_errors: AtomicU64::new(0),
            balance_polls: AtomicU64::new(0),
            poll_timeouts: AtomicU64::new(0),
            inner: RwLock::new(MetricsInner {
                start_time: Instant::now(),
                last_fill_time: None,
                last_error_time: None,
            }),
        }
    }

    // --- Increment methods ---

    pub fn inc_trade_attempts(&self) {
        self.trade_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_trades_filled(&self) {
        self.trades_filled.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_fill_time = Some(Instant::now());
    }

    pub fn inc_trades_exhausted(&self) {
        self.trades_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_submissions(&self) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_submission_rejects(&self) {
        self.submission_rejects.fetch_add(1, Ordering::Relaxed);
        self.mark_error();
    }

    pub fn inc_submission_errors(&self) {
        self.submission_errors.fetch_add(1, Ordering::Relaxed);
        self.mark_error();
    }

    pub fn inc_order_queries(&self) {
        self.order_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_query_errors(&self) {
        self.query_errors.fetch_add(1, Ordering::Relaxed);
        self.mark_error();
    }

    pub fn inc_balance_polls(&self) {
        self.balance_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_poll_timeouts(&self) {
        self.poll_timeouts.fetch_add(1, Ordering::Relaxed);
        self.mark_error();
    }

    fn mark_error(&self) {
        self.inner.write().last_error_time = Some(Instant::now());
    }

    // --- Getter methods ---

    pub fn trade_attempts(&self) -> u64 {
        self.trade_attempts.load(Ordering::Relaxed)
    }

    pub fn trades_filled(&self) -> u64 {
        self.trades_filled.load(Ordering::Relaxed)
    }

    pub fn trades_exhausted(&self) -> u64 {
        self.trades_exhausted.load(Ordering::Relaxed)
    }

    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::Relaxed)
    }

    pub fn submission_rejects(&self) -> u64 {
        self.submission_rejects.load(Ordering::Relaxed)
    }

    pub fn submission_errors(&self) -> u64 {
        self.submission_errors.load(Ordering::Relaxed)
    }

    pub fn order_queries(&self) -> u64 {
        self.order_queries.load(Ordering::Relaxed)
    }

    pub fn query_errors(&self) -> u64 {
        self.query_errors.load(Ordering::Relaxed)
    }

    pub fn balance_polls(&self) -> u64 {
        self.balance_polls.load(Ordering::Relaxed)
    }

    pub fn poll_timeouts(&self) -> u64 {
        self.poll_timeouts.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.inner.read().start_time.elapsed().as_secs_f64()
    }

    pub fn secs_since_last_fill(&self) -> Option<f64> {
        self.inner
            .read()
            .last_fill_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    pub fn secs_since_last_error(&self) -> Option<f64> {
        self.inner
            .read()
            .last_error_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    /// Generate a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            trade_attempts: self.trade_attempts(),
            trades_filled: self.trades_filled(),
            trades_exhausted: self.trades_exhausted(),
            submissions: self.submissions(),
            submission_rejects: self.submission_rejects(),
            submission_errors: self.submission_errors(),
            order_queries: self.order_queries(),
            query_errors: self.query_errors(),
            balance_polls: self.balance_polls(),
            poll_timeouts: self.poll_timeouts(),
            uptime_secs: self.uptime_secs(),
            secs_since_last_fill: self.secs_since_last_fill(),
            secs_since_last_error: self.secs_since_last_error(),
        }
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub trade_attempts: u64,
    pub trades_filled: u64,
    pub trades_exhausted: u64,
    pub submissions: u64,
    pub submission_rejects: u64,
    pub submission_errors: u64,
    pub order_queries: u64,
    pub query_errors: u64,
    pub balance_polls: u64,
    pub poll_timeouts: u64,
    pub uptime_secs: f64,
    pub secs_since_last_fill: Option<f64>,
    pub secs_since_last_error: Option<f64>,
}

impl MetricsSnapshot {
    /// Share of submissions the exchange refused, in `[0, 1]`.
    pub fn reject_rate(&self) -> f64 {
        if self.submissions == 0 {
            0.0
        } else {
            (self.submission_rejects + self.submission_errors) as f64 / self.submissions as f64
        }
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Execution Metrics ===")?;
        writeln!(f, "Uptime:              {:.1}s", self.uptime_secs)?;
        writeln!(f, "Trade attempts:      {}", self.trade_attempts)?;
        writeln!(f, "Trades filled:       {}", self.trades_filled)?;
        writeln!(f, "Trades exhausted:    {}", self.trades_exhausted)?;
        writeln!(f, "Submissions:         {}", self.submissions)?;
        writeln!(f, "Rejected:            {}", self.submission_rejects)?;
        writeln!(f, "Submission errors:   {}", self.submission_errors)?;
        writeln!(f, "Reject rate:         {:.2}", self.reject_rate())?;
        writeln!(f, "Order queries:       {}", self.order_queries)?;
        writeln!(f, "Query errors:        {}", self.query_errors)?;
        writeln!(f, "Balance polls:       {}", self.balance_polls)?;
        writeln!(f, "Poll timeouts:       {}", self.poll_timeouts)?;
        if let Some(secs) = self.secs_since_last_fill {
            writeln!(f, "Since last fill:     {:.1}s", secs)?;
        }
        if let Some(secs) = self.secs_since_last_error {
            writeln!(f, "Since last error:    {:.1}s", secs)?;
        }
        Ok(())
    }
}

/// Shared handle to metrics.
pub type SharedMetrics = Arc<ExecutionMetrics>;

pub fn create_metrics() -> SharedMetrics {
    Arc::new(ExecutionMetrics::new())
}

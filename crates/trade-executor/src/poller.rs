//! Order confirmation polling.
//!
//! A placed order goes `SUBMITTED -> VISIBLE -> FILLED`. Only successful
//! queries move it forward; a failed query keeps the current phase and waits
//! with exponential backoff before asking again. Each phase has its own
//! deadline, so a stuck order surfaces as `TradeError::PollTimeout` instead
//! of blocking forever.

use std::future::Future;

use common::ExponentialBackoff;
use execution_core::{Coin, ExchangeClient, ExchangeError, Order};
use metrics::ExecutionMetrics;
use rust_decimal::Decimal;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cancel::Cancellation;
use crate::config::PollPolicy;
use crate::error::{PollPhase, TradeError};

/// Outcome of one successful probe.
enum Probe<T> {
    Ready(T),
    Pending,
    Abort(TradeError),
}

/// Polls the exchange until an order is visible, filled, and settled.
pub struct OrderConfirmationPoller<'a, E: ?Sized> {
    exchange: &'a E,
    metrics: Option<&'a ExecutionMetrics>,
    cancel: &'a Cancellation,
}

impl<'a, E: ExchangeClient + ?Sized> OrderConfirmationPoller<'a, E> {
    pub fn new(exchange: &'a E, cancel: &'a Cancellation) -> Self {
        Self {
            exchange,
            metrics: None,
            cancel,
        }
    }

    pub fn with_metrics(mut self, metrics: &'a ExecutionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Wait until the exchange returns a snapshot for `order_id`.
    pub async fn wait_visible(
        &self,
        symbol: &str,
        order_id: u64,
        policy: &PollPolicy,
    ) -> Result<Order, TradeError> {
        let order = self
            .poll(PollPhase::Visibility, order_id, policy, || async move {
                self.query_order(symbol, order_id).await.map(Probe::Ready)
            })
            .await?;

        info!(
            symbol = %symbol,
            order_id,
            status = %order.status,
            executed_qty = %order.executed_qty,
            "Order visible"
        );
        Ok(order)
    }

    /// Wait until the order behind `visible` reports `FILLED`.
    ///
    /// `visible` is the snapshot from [`wait_visible`](Self::wait_visible);
    /// if it is already filled no query is made. Any other status keeps
    /// polling, except a terminal one (`CANCELED`, `REJECTED`, `EXPIRED`),
    /// which ends the wait with `OrderClosed`.
    pub async fn wait_filled(
        &self,
        visible: Order,
        policy: &PollPolicy,
    ) -> Result<Order, TradeError> {
        let symbol = visible.symbol.clone();
        let symbol = symbol.as_str();
        let order_id = visible.order_id;

        let order = match fill_probe(visible) {
            Probe::Ready(order) => order,
            Probe::Abort(error) => return Err(error),
            Probe::Pending => {
                self.poll(PollPhase::Fill, order_id, policy, || async move {
                    let order = self.query_order(symbol, order_id).await?;
                    Ok::<_, ExchangeError>(fill_probe(order))
                })
                .await?
            }
        };

        info!(
            symbol = %symbol,
            order_id,
            executed_qty = %order.executed_qty,
            quote_qty = %order.cumulative_quote_qty,
            "Order filled"
        );
        Ok(order)
    }

    /// Wait until the free balance of `coin` is strictly below `baseline`.
    ///
    /// Any decrease counts; it is not matched against a specific order. An
    /// asset missing from the account is read as a zero balance.
    pub async fn wait_balance_below(
        &self,
        order_id: u64,
        coin: &Coin,
        baseline: Decimal,
        policy: &PollPolicy,
    ) -> Result<Decimal, TradeError> {
        let balance = self
            .poll(PollPhase::BalanceSettlement, order_id, policy, || async move {
                if let Some(m) = self.metrics {
                    m.inc_balance_polls();
                }
                let balance = self
                    .exchange
                    .account_balances()
                    .await?
                    .free(coin.symbol())
                    .unwrap_or(Decimal::ZERO);

                debug!(coin = %coin, balance = %balance, baseline = %baseline, "Balance polled");
                Ok::<_, ExchangeError>(if balance < baseline {
                    Probe::Ready(balance)
                } else {
                    Probe::Pending
                })
            })
            .await?;

        info!(order_id, coin = %coin, before = %baseline, after = %balance, "Balance settled");
        Ok(balance)
    }

    async fn query_order(&self, symbol: &str, order_id: u64) -> Result<Order, ExchangeError> {
        if let Some(m) = self.metrics {
            m.inc_order_queries();
        }
        let order = self.exchange.get_order(symbol, order_id).await?;
        debug!(
            symbol = %symbol,
            order_id,
            status = %order.status,
            executed_qty = %order.executed_qty,
            "Order polled"
        );
        Ok(order)
    }

    async fn poll<T, F, Fut>(
        &self,
        phase: PollPhase,
        order_id: u64,
        policy: &PollPolicy,
        mut probe: F,
    ) -> Result<T, TradeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Probe<T>, ExchangeError>>,
    {
        let started = Instant::now();
        let mut backoff = ExponentialBackoff::new(policy.error_delay, policy.max_error_delay);

        if !policy.settle_delay.is_zero() {
            self.cancel.sleep(policy.settle_delay).await?;
        }

        loop {
            self.cancel.check()?;

            let delay = match probe().await {
                Ok(Probe::Ready(value)) => return Ok(value),
                Ok(Probe::Abort(error)) => return Err(error),
                Ok(Probe::Pending) => {
                    backoff.reset();
                    policy.interval
                }
                Err(error) => {
                    if let Some(m) = self.metrics {
                        m.inc_query_errors();
                    }
                    let delay = backoff.next_delay();
                    warn!(
                        phase = %phase,
                        order_id,
                        error = %error,
                        retry_in_ms = delay.as_millis() as u64,
                        "Query failed, retrying"
                    );
                    delay
                }
            };

            let waited = started.elapsed();
            if waited >= policy.timeout {
                if let Some(m) = self.metrics {
                    m.inc_poll_timeouts();
                }
                warn!(
                    phase = %phase,
                    order_id,
                    waited_ms = waited.as_millis() as u64,
                    "Polling timed out, order may still be live"
                );
                return Err(TradeError::PollTimeout {
                    phase,
                    order_id,
                    waited,
                });
            }

            // The last query lands on the deadline.
            self.cancel.sleep(delay.min(policy.timeout - waited)).await?;
        }
    }
}

/// Classify an order snapshot for the fill phase.
fn fill_probe(order: Order) -> Probe<Order> {
    if order.is_filled() {
        Probe::Ready(order)
    } else if order.status.is_closed_unfilled() {
        Probe::Abort(TradeError::OrderClosed {
            order_id: order.order_id,
            status: order.status,
        })
    } else {
        Probe::Pending
    }
}

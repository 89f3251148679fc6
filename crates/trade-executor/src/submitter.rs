//! Order placement with resubmission on failure.

use execution_core::{ExchangeClient, ExchangeError, Order};
use metrics::ExecutionMetrics;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::cancel::Cancellation;
use crate::config::SubmitPolicy;
use crate::error::TradeError;

/// An order to place.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderRequest {
    /// Good-till-canceled limit buy.
    LimitBuy {
        symbol: String,
        quantity: Decimal,
        price: Decimal,
    },
    MarketSell { symbol: String, quantity: Decimal },
}

impl OrderRequest {
    pub fn limit_buy(symbol: impl Into<String>, quantity: Decimal, price: Decimal) -> Self {
        Self::LimitBuy {
            symbol: symbol.into(),
            quantity,
            price,
        }
    }

    pub fn market_sell(symbol: impl Into<String>, quantity: Decimal) -> Self {
        Self::MarketSell {
            symbol: symbol.into(),
            quantity,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Self::LimitBuy { symbol, .. } | Self::MarketSell { symbol, .. } => symbol,
        }
    }

    pub fn quantity(&self) -> Decimal {
        match self {
            Self::LimitBuy { quantity, .. } | Self::MarketSell { quantity, .. } => *quantity,
        }
    }
}

/// Places one order, resubmitting after every failed placement.
///
/// Exchange rejections wait `rejected_delay` before the next placement;
/// other failures wait `unexpected_delay`. With a bounded policy the last
/// error is returned as `TradeError::SubmissionFailed` once the attempts run
/// out.
pub struct OrderSubmitter<'a, E: ?Sized> {
    exchange: &'a E,
    policy: &'a SubmitPolicy,
    metrics: Option<&'a ExecutionMetrics>,
    cancel: &'a Cancellation,
}

impl<'a, E: ExchangeClient + ?Sized> OrderSubmitter<'a, E> {
    pub fn new(exchange: &'a E, policy: &'a SubmitPolicy, cancel: &'a Cancellation) -> Self {
        Self {
            exchange,
            policy,
            metrics: None,
            cancel,
        }
    }

    pub fn with_metrics(mut self, metrics: &'a ExecutionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Place `request`, returning the order snapshot the exchange accepted.
    pub async fn submit(&self, request: &OrderRequest) -> Result<Order, TradeError> {
        let mut attempts = 0u32;

        loop {
            self.cancel.check()?;
            attempts += 1;
            if let Some(m) = self.metrics {
                m.inc_submissions();
            }

            let error = match self.place(request).await {
                Ok(order) => {
                    info!(
                        symbol = %order.symbol,
                        order_id = order.order_id,
                        status = %order.status,
                        quantity = %order.quantity,
                        attempts,
                        "Order accepted"
                    );
                    return Ok(order);
                }
                Err(error) => error,
            };

            if error.is_rejected() {
                if let Some(m) = self.metrics {
                    m.inc_submission_rejects();
                }
                warn!(
                    symbol = %request.symbol(),
                    attempt = attempts,
                    error = %error,
                    "Order rejected by exchange, resubmitting"
                );
            } else {
                if let Some(m) = self.metrics {
                    m.inc_submission_errors();
                }
                warn!(
                    symbol = %request.symbol(),
                    attempt = attempts,
                    error = %error,
                    "Unexpected error placing order, resubmitting"
                );
            }

            if self.policy.is_exhausted(attempts) {
                return Err(TradeError::SubmissionFailed {
                    attempts,
                    last: error,
                });
            }

            let delay = self.policy.delay_for(&error);
            if !delay.is_zero() {
                self.cancel.sleep(delay).await?;
            }
        }
    }

    async fn place(&self, request: &OrderRequest) -> Result<Order, ExchangeError> {
        match request {
            OrderRequest::LimitBuy {
                symbol,
                quantity,
                price,
            } => self.exchange.place_limit_buy(symbol, *quantity, *price).await,
            OrderRequest::MarketSell { symbol, quantity } => {
                self.exchange.place_market_sell(symbol, *quantity).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedExchange;
    use execution_core::{OrderStatus, OrderType};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn exchange() -> SimulatedExchange {
        SimulatedExchange::new()
            .with_balance("BTC", dec!(1))
            .with_ticker("ETHBTC", dec!(0.05))
            .with_step_size("ETHBTC", "0.00100000")
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubmits_until_accepted() {
        let exchange = exchange();
        exchange.script_placements([
            Err(ExchangeError::rejected(-1013, "Filter failure: PRICE_FILTER")),
            Err(ExchangeError::unexpected("connection reset")),
            Err(ExchangeError::rejected(-2010, "insufficient balance")),
        ]);

        let policy = SubmitPolicy::default();
        let cancel = Cancellation::never();
        let metrics = ExecutionMetrics::new();
        let submitter = OrderSubmitter::new(&exchange, &policy, &cancel).with_metrics(&metrics);

        let start = tokio::time::Instant::now();
        let order = submitter
            .submit(&OrderRequest::limit_buy("ETHBTC", dec!(19.999), dec!(0.05)))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.quantity, dec!(19.999));
        assert_eq!(exchange.placement_calls(), 4);
        assert_eq!(metrics.submissions(), 4);
        assert_eq!(metrics.submission_rejects(), 2);
        assert_eq!(metrics.submission_errors(), 1);
        // Two rejections at one second each, no wait after the unexpected error.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_millis(2050));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_policy_returns_last_error() {
        let exchange = exchange();
        exchange.reject_all_placements(ExchangeError::rejected(-1013, "Filter failure: LOT_SIZE"));

        let policy = SubmitPolicy::default().with_max_attempts(3);
        let cancel = Cancellation::never();
        let submitter = OrderSubmitter::new(&exchange, &policy, &cancel);

        let err = submitter
            .submit(&OrderRequest::market_sell("ETHBTC", dec!(1)))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TradeError::SubmissionFailed {
                attempts: 3,
                last: ExchangeError::rejected(-1013, "Filter failure: LOT_SIZE"),
            }
        );
        assert_eq!(exchange.placement_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_policy_stops_on_cancel() {
        let exchange = exchange();
        exchange.reject_all_placements(ExchangeError::rejected(-2010, "insufficient balance"));

        let policy = SubmitPolicy::default().unbounded();
        let (tx, cancel) = crate::cancel::cancellation();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(100)).await;
            tx.send(true).ok();
        });

        let submitter = OrderSubmitter::new(&exchange, &policy, &cancel);
        let err = submitter
            .submit(&OrderRequest::limit_buy("ETHBTC", dec!(1), dec!(0.05)))
            .await
            .unwrap_err();

        assert_eq!(err, TradeError::Cancelled);
        assert!(exchange.placement_calls() > 10);
    }
}

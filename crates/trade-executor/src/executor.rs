//! Buy and sell orchestration.

use execution_core::{
    Coin, ExchangeClient, Order, TickerSnapshot, TradeIntent, TradeLogError, TradeLogStore,
    TradeRecord, TradeSide,
};
use metrics::SharedMetrics;
use rust_decimal::Decimal;
use tracing::{error, info};

use crate::cancel::Cancellation;
use crate::config::ExecutorConfig;
use crate::error::{RetryExhausted, TradeError};
use crate::poller::OrderConfirmationPoller;
use crate::retry::retry;
use crate::submitter::{OrderRequest, OrderSubmitter};

/// Turns one trade decision into a confirmed fill.
///
/// `execute_buy` and `execute_sell` run a single attempt and return the
/// final order snapshot. `buy_alt`, `sell_alt` and `run` wrap them in the
/// configured retry policy. An attempt that times out after its order was
/// accepted is never retried, so at most one order is left unconfirmed.
pub struct TradeExecutor<E, L> {
    exchange: E,
    trade_log: L,
    config: ExecutorConfig,
    metrics: Option<SharedMetrics>,
    cancel: Cancellation,
}

impl<E: ExchangeClient, L: TradeLogStore> TradeExecutor<E, L> {
    pub fn new(exchange: E, trade_log: L) -> Self {
        Self {
            exchange,
            trade_log,
            config: ExecutorConfig::default(),
            metrics: None,
            cancel: Cancellation::never(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    pub fn trade_log(&self) -> &L {
        &self.trade_log
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Buy `origin` with the whole free `target` balance, at the price in
    /// `tickers`, retrying the whole trade per the retry policy.
    pub async fn buy_alt(
        &self,
        origin: &Coin,
        target: &Coin,
        tickers: &TickerSnapshot,
    ) -> Result<Order, RetryExhausted> {
        let intent = TradeIntent::buy(origin.clone(), target.clone());
        self.with_retry(&intent, |_| self.execute_buy(origin, target, tickers))
            .await
    }

    /// Sell the whole free `origin` balance for `target`, retrying the whole
    /// trade per the retry policy.
    pub async fn sell_alt(&self, origin: &Coin, target: &Coin) -> Result<Order, RetryExhausted> {
        let intent = TradeIntent::sell(origin.clone(), target.clone());
        self.with_retry(&intent, |_| self.execute_sell(origin, target))
            .await
    }

    /// Execute `intent` with retry. Buys read a fresh ticker snapshot on
    /// every attempt.
    pub async fn run(&self, intent: &TradeIntent) -> Result<Order, RetryExhausted> {
        self.with_retry(intent, |_| async move {
            match intent.side {
                TradeSide::Buy => {
                    let tickers = self.exchange.all_tickers().await?;
                    self.execute_buy(&intent.origin, &intent.target, &tickers)
                        .await
                }
                TradeSide::Sell => self.execute_sell(&intent.origin, &intent.target).await,
            }
        })
        .await
    }

    /// One buy attempt: limit-buy `origin` on the `origin + target` pair with
    /// the whole free `target` balance.
    ///
    /// Balances are read once; the price comes from `tickers` and is not
    /// re-read during the trade.
    pub async fn execute_buy(
        &self,
        origin: &Coin,
        target: &Coin,
        tickers: &TickerSnapshot,
    ) -> Result<Order, TradeError> {
        let intent = TradeIntent::buy(origin.clone(), target.clone());
        let symbol = intent.pair_symbol();
        let mut record = TradeRecord::new(&intent);
        self.save(&record);

        let step_size = self.exchange.symbol_info(&symbol).await?.step_size()?;
        let balances = self.exchange.account_balances().await?;
        let origin_balance = balances.free(origin.symbol()).unwrap_or(Decimal::ZERO);
        let target_balance = balances
            .free(target.symbol())
            .ok_or_else(|| TradeError::MissingBalance(target.clone()))?;

        let price = tickers
            .price_of(&symbol)
            .ok_or_else(|| TradeError::MissingPrice(symbol.clone()))?;
        if price <= Decimal::ZERO {
            return Err(TradeError::InvalidPrice { symbol, price });
        }

        let quantity = step_size.round_down(target_balance / price);
        info!(
            symbol = %symbol,
            origin_balance = %origin_balance,
            target_balance = %target_balance,
            price = %price,
            step = %step_size,
            quantity = %quantity,
            "Buy quantity computed"
        );
        if quantity.is_zero() {
            return Err(TradeError::ZeroQuantity { symbol });
        }

        let order = self
            .submitter()
            .submit(&OrderRequest::limit_buy(&symbol, quantity, price))
            .await?;

        self.record(&mut record, |r| {
            r.set_ordered(origin_balance, target_balance, quantity)
        });

        let poller = self.poller();
        let visible = poller
            .wait_visible(&symbol, order.order_id, &self.config.buy_visibility)
            .await?;
        let filled = poller.wait_filled(visible, &self.config.fill).await?;

        self.complete(&mut record, &filled);
        Ok(filled)
    }

    /// One sell attempt: market-sell the whole free `origin` balance on the
    /// `origin + target` pair.
    ///
    /// After the fill, waits until the origin balance drops below the
    /// pre-trade sample before recording completion.
    pub async fn execute_sell(&self, origin: &Coin, target: &Coin) -> Result<Order, TradeError> {
        let intent = TradeIntent::sell(origin.clone(), target.clone());
        let symbol = intent.pair_symbol();
        let mut record = TradeRecord::new(&intent);
        self.save(&record);

        let step_size = self.exchange.symbol_info(&symbol).await?.step_size()?;
        let balances = self.exchange.account_balances().await?;
        let origin_balance = balances
            .free(origin.symbol())
            .ok_or_else(|| TradeError::MissingBalance(origin.clone()))?;
        let target_balance = balances.free(target.symbol()).unwrap_or(Decimal::ZERO);

        let quantity = step_size.round_down(origin_balance);
        info!(
            symbol = %symbol,
            origin_balance = %origin_balance,
            target_balance = %target_balance,
            step = %step_size,
            quantity = %quantity,
            "Sell quantity computed"
        );
        if quantity.is_zero() {
            return Err(TradeError::ZeroQuantity { symbol });
        }

        let order = self
            .submitter()
            .submit(&OrderRequest::market_sell(&symbol, quantity))
            .await?;

        self.record(&mut record, |r| {
            r.set_ordered(origin_balance, target_balance, quantity)
        });

        let poller = self.poller();
        let visible = poller
            .wait_visible(&symbol, order.order_id, &self.config.sell_visibility)
            .await?;
        let filled = poller.wait_filled(visible, &self.config.fill).await?;

        // The fill is final only once the ledger shows it.
        poller
            .wait_balance_below(
                filled.order_id,
                origin,
                origin_balance,
                &self.config.balance_settlement,
            )
            .await?;

        self.complete(&mut record, &filled);
        Ok(filled)
    }

    async fn with_retry<F, Fut>(
        &self,
        intent: &TradeIntent,
        mut attempt: F,
    ) -> Result<Order, RetryExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<Order, TradeError>>,
    {
        let result = retry(&self.config.retry, |n| {
            if let Some(m) = &self.metrics {
                m.inc_trade_attempts();
            }
            info!(trade = %intent, attempt = n, "Starting trade attempt");
            attempt(n)
        })
        .await;

        if let Err(exhausted) = &result {
            if let Some(m) = &self.metrics {
                m.inc_trades_exhausted();
            }
            error!(
                trade = %intent,
                attempts = exhausted.attempts,
                live_order_id = ?exhausted.live_order_id(),
                last_error = %exhausted.last_error,
                "Trade not confirmed"
            );
        }
        result
    }

    fn submitter(&self) -> OrderSubmitter<'_, E> {
        let submitter = OrderSubmitter::new(&self.exchange, &self.config.submit, &self.cancel);
        match &self.metrics {
            Some(m) => submitter.with_metrics(m),
            None => submitter,
        }
    }

    fn poller(&self) -> OrderConfirmationPoller<'_, E> {
        let poller = OrderConfirmationPoller::new(&self.exchange, &self.cancel);
        match &self.metrics {
            Some(m) => poller.with_metrics(m),
            None => poller,
        }
    }

    fn complete(&self, record: &mut TradeRecord, filled: &Order) {
        self.record(record, |r| r.set_complete(filled.cumulative_quote_qty));
        if let Some(m) = &self.metrics {
            m.inc_trades_filled();
        }
        info!(
            symbol = %filled.symbol,
            order_id = filled.order_id,
            quote_qty = %filled.cumulative_quote_qty,
            "Trade complete"
        );
    }

    /// Apply a phase transition and persist it. The order is already live on
    /// the exchange, so failures are logged rather than returned.
    fn record(
        &self,
        record: &mut TradeRecord,
        transition: impl FnOnce(&mut TradeRecord) -> Result<(), TradeLogError>,
    ) {
        match transition(record) {
            Ok(()) => self.save(record),
            Err(err) => error!(trade_id = %record.id, error = %err, "Invalid trade record transition"),
        }
    }

    fn save(&self, record: &TradeRecord) {
        if let Err(err) = self.trade_log.save(record) {
            error!(trade_id = %record.id, state = ?record.state, error = %err, "Failed to write trade record");
        }
    }
}

//! In-process exchange for exercising the trade flow without network access.
//!
//! Placements are accepted immediately unless scripted otherwise. Order
//! queries replay a script of statuses and failures, then report `FILLED`.
//! A fill moves balances after a configurable number of balance reads,
//! modelling an exchange that reports the fill before its ledger catches up.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use execution_core::{
    BalanceSnapshot, ExchangeClient, ExchangeError, Order, OrderSide, OrderStatus, OrderType,
    SymbolFilter, SymbolInfo, TickerPrice, TickerSnapshot,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;

/// First simulated order ID.
const FIRST_ORDER_ID: u64 = 1_000_000;

/// One scripted answer to an order query.
#[derive(Debug, Clone)]
pub enum OrderStep {
    Status(OrderStatus),
    Fail(ExchangeError),
}

#[derive(Debug)]
struct PendingSettlement {
    deltas: Vec<(String, Decimal)>,
    reads_left: u32,
}

#[derive(Debug, Default)]
struct SimState {
    tickers: Vec<TickerPrice>,
    balances: HashMap<String, Decimal>,
    symbols: HashMap<String, SymbolInfo>,
    /// Base and quote asset of each pair.
    pairs: HashMap<String, (String, String)>,
    orders: HashMap<u64, Order>,
    placement_script: VecDeque<Result<(), ExchangeError>>,
    persistent_rejection: Option<ExchangeError>,
    order_script: VecDeque<OrderStep>,
    held_status: Option<OrderStatus>,
    balance_failures: VecDeque<ExchangeError>,
    frozen_balances: bool,
    settlement_lag: u32,
    pending: Vec<PendingSettlement>,
}

/// Scripted, in-memory `ExchangeClient`.
#[derive(Debug, Default)]
pub struct SimulatedExchange {
    state: Mutex<SimState>,
    next_order_id: AtomicU64,
    placement_calls: AtomicU64,
    order_queries: AtomicU64,
    balance_reads: AtomicU64,
}

impl SimulatedExchange {
    pub fn new() -> Self {
        Self {
            next_order_id: AtomicU64::new(FIRST_ORDER_ID),
            ..Self::default()
        }
    }

    // --- Builder methods ---

    pub fn with_balance(self, asset: &str, free: Decimal) -> Self {
        self.state.lock().balances.insert(asset.to_string(), free);
        self
    }

    pub fn with_ticker(self, symbol: &str, price: Decimal) -> Self {
        let mut state = self.state.lock();
        state.tickers.retain(|t| t.symbol != symbol);
        state.tickers.push(TickerPrice::new(symbol, price));
        drop(state);
        self
    }

    /// Register `base + quote` as a tradable pair with a `LOT_SIZE` step.
    pub fn with_pair(self, base: &str, quote: &str, step_size: &str) -> Self {
        let symbol = format!("{}{}", base, quote);
        let mut state = self.state.lock();
        state
            .pairs
            .insert(symbol.clone(), (base.to_string(), quote.to_string()));
        state.symbols.insert(
            symbol.clone(),
            SymbolInfo {
                symbol,
                filters: vec![SymbolFilter::LotSize {
                    min_qty: "0".to_string(),
                    max_qty: "9000000000".to_string(),
                    step_size: step_size.to_string(),
                }],
            },
        );
        drop(state);
        self
    }

    /// Shorthand for a pair quoted in BTC, e.g. `ETHBTC`.
    pub fn with_step_size(self, symbol: &str, step_size: &str) -> Self {
        match symbol.strip_suffix("BTC") {
            Some(base) if !base.is_empty() => self.with_pair(base, "BTC", step_size),
            _ => self.with_symbol_info(SymbolInfo {
                symbol: symbol.to_string(),
                filters: vec![SymbolFilter::LotSize {
                    min_qty: "0".to_string(),
                    max_qty: "9000000000".to_string(),
                    step_size: step_size.to_string(),
                }],
            }),
        }
    }

    /// Serve `info` verbatim for its symbol.
    pub fn with_symbol_info(self, info: SymbolInfo) -> Self {
        self.state.lock().symbols.insert(info.symbol.clone(), info);
        self
    }

    /// Number of balance reads that still see pre-fill balances.
    pub fn with_settlement_lag(self, reads: u32) -> Self {
        self.state.lock().settlement_lag = reads;
        self
    }

    // --- Scripting ---

    /// Outcomes for the next placements; accepted once the script runs out.
    pub fn script_placements(&self, outcomes: impl IntoIterator<Item = Result<(), ExchangeError>>) {
        self.state.lock().placement_script.extend(outcomes);
    }

    /// Refuse every placement with `error`.
    pub fn reject_all_placements(&self, error: ExchangeError) {
        self.state.lock().persistent_rejection = Some(error);
    }

    /// Answers for the next order queries; `FILLED` once the script runs out.
    pub fn script_order_steps(&self, steps: impl IntoIterator<Item = OrderStep>) {
        self.state.lock().order_script.extend(steps);
    }

    /// Report `status` for every order query, ignoring the script.
    pub fn hold_order_status(&self, status: OrderStatus) {
        self.state.lock().held_status = Some(status);
    }

    /// Fail the next balance reads.
    pub fn fail_balance_reads(&self, errors: impl IntoIterator<Item = ExchangeError>) {
        self.state.lock().balance_failures.extend(errors);
    }

    /// Stop applying fills to balances.
    pub fn freeze_balances(&self) {
        self.state.lock().frozen_balances = true;
    }

    pub fn set_balance(&self, asset: &str, free: Decimal) {
        self.state.lock().balances.insert(asset.to_string(), free);
    }

    // --- Inspection ---

    pub fn balance(&self, asset: &str) -> Decimal {
        self.state
            .lock()
            .balances
            .get(asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Orders accepted so far, oldest first.
    pub fn placed_orders(&self) -> Vec<Order> {
        let state = self.state.lock();
        let mut orders: Vec<Order> = state.orders.values().cloned().collect();
        orders.sort_by_key(|o| o.order_id);
        orders
    }

    pub fn placement_calls(&self) -> u64 {
        self.placement_calls.load(Ordering::Relaxed)
    }

    pub fn order_queries(&self) -> u64 {
        self.order_queries.load(Ordering::Relaxed)
    }

    pub fn balance_reads(&self) -> u64 {
        self.balance_reads.load(Ordering::Relaxed)
    }

    fn place(
        &self,
        symbol: &str,
        side: OrderSide,
        order_type: OrderType,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Result<Order, ExchangeError> {
        self.placement_calls.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock();

        if let Some(error) = &state.persistent_rejection {
            return Err(error.clone());
        }
        if let Some(Err(error)) = state.placement_script.pop_front() {
            return Err(error);
        }
        if !state.symbols.contains_key(symbol) {
            return Err(ExchangeError::rejected(-1121, "Invalid symbol."));
        }

        let order = Order {
            order_id: self.next_order_id.fetch_add(1, Ordering::Relaxed),
            symbol: symbol.to_string(),
            side,
            order_type,
            status: OrderStatus::New,
            quantity,
            price,
            executed_qty: Decimal::ZERO,
            cumulative_quote_qty: Decimal::ZERO,
            updated_at_ms: 0,
        };
        state.orders.insert(order.order_id, order.clone());
        Ok(order)
    }
}

impl SimState {
    fn price_of(&self, symbol: &str) -> Option<Decimal> {
        self.tickers
            .iter()
            .find(|t| t.symbol == symbol)
            .map(|t| t.price)
    }

    /// Queue the balance movement of a freshly filled order.
    fn schedule_settlement(&mut self, order: &Order) {
        let Some((base, quote)) = self.pairs.get(&order.symbol).cloned() else {
            return;
        };

        let quote_qty = order.cumulative_quote_qty;
        let deltas = match order.side {
            OrderSide::Buy => vec![(base, order.executed_qty), (quote, -quote_qty)],
            OrderSide::Sell => vec![(base, -order.executed_qty), (quote, quote_qty)],
        };
        self.pending.push(PendingSettlement {
            deltas,
            reads_left: self.settlement_lag,
        });
    }

    fn settle_due(&mut self) {
        if self.frozen_balances {
            return;
        }

        let mut due = Vec::new();
        self.pending.retain_mut(|p| {
            if p.reads_left == 0 {
                due.append(&mut p.deltas);
                false
            } else {
                p.reads_left -= 1;
                true
            }
        });

        for (asset, delta) in due {
            *self.balances.entry(asset).or_insert(Decimal::ZERO) += delta;
        }
    }
}

#[async_trait]
impl ExchangeClient for SimulatedExchange {
    async fn all_tickers(&self) -> Result<TickerSnapshot, ExchangeError> {
        Ok(TickerSnapshot::new(self.state.lock().tickers.clone()))
    }

    async fn symbol_ticker(&self, symbol: &str) -> Result<TickerPrice, ExchangeError> {
        let state = self.state.lock();
        state
            .price_of(symbol)
            .map(|price| TickerPrice::new(symbol, price))
            .ok_or_else(|| ExchangeError::rejected(-1121, "Invalid symbol."))
    }

    async fn account_balances(&self) -> Result<BalanceSnapshot, ExchangeError> {
        self.balance_reads.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock();

        if let Some(error) = state.balance_failures.pop_front() {
            return Err(error);
        }

        state.settle_due();
        Ok(BalanceSnapshot::new(state.balances.clone()))
    }

    async fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, ExchangeError> {
        self.state
            .lock()
            .symbols
            .get(symbol)
            .cloned()
            .ok_or_else(|| ExchangeError::rejected(-1121, "Invalid symbol."))
    }

    async fn place_limit_buy(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Order, ExchangeError> {
        self.place(symbol, OrderSide::Buy, OrderType::Limit, quantity, Some(price))
    }

    async fn place_market_sell(
        &self,
        symbol: &str,
        quantity: Decimal,
    ) -> Result<Order, ExchangeError> {
        self.place(symbol, OrderSide::Sell, OrderType::Market, quantity, None)
    }

    async fn get_order(&self, symbol: &str, order_id: u64) -> Result<Order, ExchangeError> {
        self.order_queries.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock();

        let Some(current) = state.orders.get(&order_id).cloned() else {
            return Err(ExchangeError::rejected(-2013, "Order does not exist."));
        };
        if current.symbol != symbol {
            return Err(ExchangeError::rejected(-2013, "Order does not exist."));
        }

        let status = match state.held_status {
            Some(status) => status,
            None => match state.order_script.pop_front() {
                Some(OrderStep::Fail(error)) => return Err(error),
                Some(OrderStep::Status(status)) => status,
                None => OrderStatus::Filled,
            },
        };

        let mut order = current.clone();
        order.status = status;
        if status == OrderStatus::Filled {
            let price = order
                .price
                .or_else(|| state.price_of(&order.symbol))
                .unwrap_or(Decimal::ZERO);
            order.executed_qty = order.quantity;
            order.cumulative_quote_qty = order.quantity * price;

            if current.status != OrderStatus::Filled {
                state.schedule_settlement(&order);
            }
        }

        state.orders.insert(order_id, order.clone());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn exchange() -> SimulatedExchange {
        SimulatedExchange::new()
            .with_balance("ETH", dec!(2))
            .with_balance("BTC", dec!(0.5))
            .with_ticker("ETHBTC", dec!(0.05))
            .with_step_size("ETHBTC", "0.00100000")
    }

    #[tokio::test]
    async fn test_sell_settles_after_lag() {
        let exchange = exchange().with_settlement_lag(1);
        let order = exchange.place_market_sell("ETHBTC", dec!(2)).await.unwrap();

        let filled = exchange.get_order("ETHBTC", order.order_id).await.unwrap();
        assert!(filled.is_filled());
        assert_eq!(filled.cumulative_quote_qty, dec!(0.1));

        let first = exchange.account_balances().await.unwrap();
        assert_eq!(first.free("ETH"), Some(dec!(2)));

        let second = exchange.account_balances().await.unwrap();
        assert_eq!(second.free("ETH"), Some(dec!(0)));
        assert_eq!(second.free("BTC"), Some(dec!(0.6)));
    }

    #[tokio::test]
    async fn test_fill_settles_once() {
        let exchange = exchange();
        let order = exchange
            .place_limit_buy("ETHBTC", dec!(10), dec!(0.05))
            .await
            .unwrap();

        exchange.get_order("ETHBTC", order.order_id).await.unwrap();
        exchange.get_order("ETHBTC", order.order_id).await.unwrap();
        exchange.account_balances().await.unwrap();

        assert_eq!(exchange.balance("ETH"), dec!(12));
        assert_eq!(exchange.balance("BTC"), dec!(0));
    }

    #[tokio::test]
    async fn test_scripts_and_errors() {
        let exchange = exchange();
        exchange.script_placements([Err(ExchangeError::unexpected("boom"))]);

        assert!(exchange.place_market_sell("ETHBTC", dec!(1)).await.is_err());
        let order = exchange.place_market_sell("ETHBTC", dec!(1)).await.unwrap();
        assert_eq!(order.order_id, FIRST_ORDER_ID);

        exchange.script_order_steps([OrderStep::Status(OrderStatus::PartiallyFilled)]);
        let polled = exchange.get_order("ETHBTC", order.order_id).await.unwrap();
        assert_eq!(polled.status, OrderStatus::PartiallyFilled);

        let missing = exchange.get_order("ETHBTC", 42).await.unwrap_err();
        assert!(missing.is_rejected());

        let unknown = exchange.symbol_info("XRPBTC").await.unwrap_err();
        assert!(unknown.is_rejected());
        assert_eq!(exchange.placement_calls(), 2);
    }
}

//! The exchange port used by the trade executor.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::market::{BalanceSnapshot, SymbolInfo, TickerPrice, TickerSnapshot};
use crate::order::Order;

/// Failure of a single exchange call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// Structured error returned by the exchange: insufficient balance,
    /// invalid price, unknown order, rate limit, ...
    #[error("exchange rejected request ({code}): {message}")]
    Rejected {
        /// Exchange error code.
        code: i32,
        /// Exchange error message.
        message: String,
    },

    /// Anything else: network failure, unparseable response, signing failure.
    #[error("unexpected exchange error: {0}")]
    Unexpected(String),
}

impl ExchangeError {
    pub fn rejected(code: i32, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// True for structured exchange errors.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Operations the executor needs from an exchange.
///
/// Implemented by the live REST client and by in-process simulators, so the
/// order state machine can run without network access.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Last price of every symbol.
    async fn all_tickers(&self) -> Result<TickerSnapshot, ExchangeError>;

    /// Last price of one symbol.
    async fn symbol_ticker(&self, symbol: &str) -> Result<TickerPrice, ExchangeError>;

    /// Free balance of every asset in the account.
    async fn account_balances(&self) -> Result<BalanceSnapshot, ExchangeError>;

    /// Trading rules for `symbol`.
    async fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, ExchangeError>;

    /// Place a good-till-canceled limit buy.
    async fn place_limit_buy(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Order, ExchangeError>;

    /// Place a market sell.
    async fn place_market_sell(&self, symbol: &str, quantity: Decimal)
        -> Result<Order, ExchangeError>;

    /// Current state of an order.
    async fn get_order(&self, symbol: &str, order_id: u64) -> Result<Order, ExchangeError>;
}

#[async_trait]
impl<T: ExchangeClient + ?Sized> ExchangeClient for Arc<T> {
    async fn all_tickers(&self) -> Result<TickerSnapshot, ExchangeError> {
        (**self).all_tickers().await
    }

    async fn symbol_ticker(&self, symbol: &str) -> Result<TickerPrice, ExchangeError> {
        (**self).symbol_ticker(symbol).await
    }

    async fn account_balances(&self) -> Result<BalanceSnapshot, ExchangeError> {
        (**self).account_balances().await
    }

    async fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, ExchangeError> {
        (**self).symbol_info(symbol).await
    }

    async fn place_limit_buy(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Order, ExchangeError> {
        (**self).place_limit_buy(symbol, quantity, price).await
    }

    async fn place_market_sell(
        &self,
        symbol: &str,
        quantity: Decimal,
    ) -> Result<Order, ExchangeError> {
        (**self).place_market_sell(symbol, quantity).await
    }

    async fn get_order(&self, symbol: &str, order_id: u64) -> Result<Order, ExchangeError> {
        (**self).get_order(symbol, order_id).await
    }
}

//! `ExchangeClient` over the live REST API.

use crate::client::BinanceRestClient;
use async_trait::async_trait;
use execution_core::{
    BalanceSnapshot, ExchangeClient, ExchangeError, Order, OrderSide, OrderType, SymbolInfo,
    TickerPrice, TickerSnapshot,
};
use rust_decimal::Decimal;

#[async_trait]
impl ExchangeClient for BinanceRestClient {
    async fn all_tickers(&self) -> Result<TickerSnapshot, ExchangeError> {
        Ok(self.get_all_tickers().await?)
    }

    async fn symbol_ticker(&self, symbol: &str) -> Result<TickerPrice, ExchangeError> {
        Ok(self.get_symbol_ticker(symbol).await?)
    }

    async fn account_balances(&self) -> Result<BalanceSnapshot, ExchangeError> {
        Ok(self.get_balances().await?)
    }

    async fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, ExchangeError> {
        Ok(self.get_symbol_info(symbol).await?)
    }

    async fn place_limit_buy(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Order, ExchangeError> {
        Ok(self
            .place_order(symbol, OrderSide::Buy, OrderType::Limit, quantity, Some(price))
            .await?)
    }

    async fn place_market_sell(
        &self,
        symbol: &str,
        quantity: Decimal,
    ) -> Result<Order, ExchangeError> {
        Ok(self
            .place_order(symbol, OrderSide::Sell, OrderType::Market, quantity, None)
            .await?)
    }

    async fn get_order(&self, symbol: &str, order_id: u64) -> Result<Order, ExchangeError> {
        Ok(self.query_order_by_id(symbol, order_id).await?)
    }
}

//! Market data snapshots read from the exchange.

use crate::quantity::{ExchangeRuleError, StepSize};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Last price of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: Decimal,
}

impl TickerPrice {
    pub fn new(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
        }
    }
}

/// Prices of all symbols sampled at one point in time.
///
/// A buy computes its quantity and limit price from the same snapshot, so the
/// price is never re-read halfway through a trade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerSnapshot {
    tickers: Vec<TickerPrice>,
}

impl TickerSnapshot {
    pub fn new(tickers: Vec<TickerPrice>) -> Self {
        Self { tickers }
    }

    /// Price of `symbol`, if present in the snapshot.
    pub fn price_of(&self, symbol: &str) -> Option<Decimal> {
        self.tickers
            .iter()
            .find(|t| t.symbol == symbol)
            .map(|t| t.price)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

impl From<Vec<TickerPrice>> for TickerSnapshot {
    fn from(tickers: Vec<TickerPrice>) -> Self {
        Self::new(tickers)
    }
}

/// Free balance per asset, sampled with a single account read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceSnapshot {
    free: HashMap<String, Decimal>,
}

impl BalanceSnapshot {
    pub fn new(free: HashMap<String, Decimal>) -> Self {
        Self { free }
    }

    /// Free balance of `asset`; `None` if the account does not list it.
    pub fn free(&self, asset: &str) -> Option<Decimal> {
        self.free.get(asset).copied()
    }
}

impl FromIterator<(String, Decimal)> for BalanceSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// One exchange trading rule for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filterType")]
pub enum SymbolFilter {
    #[serde(rename = "LOT_SIZE", rename_all = "camelCase")]
    LotSize {
        min_qty: String,
        max_qty: String,
        step_size: String,
    },
    #[serde(rename = "PRICE_FILTER", rename_all = "camelCase")]
    PriceFilter {
        min_price: String,
        max_price: String,
        tick_size: String,
    },
    /// Any filter this executor does not interpret.
    #[serde(other)]
    Other,
}

/// Trading rules for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub filters: Vec<SymbolFilter>,
}

impl SymbolInfo {
    /// Raw `stepSize` of the `LOT_SIZE` filter.
    pub fn lot_size_step(&self) -> Result<&str, ExchangeRuleError> {
        self.filters
            .iter()
            .find_map(|f| match f {
                SymbolFilter::LotSize { step_size, .. } => Some(step_size.as_str()),
                _ => None,
            })
            .ok_or_else(|| ExchangeRuleError::MissingLotSize(self.symbol.clone()))
    }

    /// Parsed quantity increment of the `LOT_SIZE` filter.
    pub fn step_size(&self) -> Result<StepSize, ExchangeRuleError> {
        StepSize::parse(self.lot_size_step()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ticker_lookup() {
        let snapshot = TickerSnapshot::from(vec![
            TickerPrice::new("ETHBTC", dec!(0.0521)),
            TickerPrice::new("BNBBTC", dec!(0.0093)),
        ]);

        assert_eq!(snapshot.price_of("BNBBTC"), Some(dec!(0.0093)));
        assert_eq!(snapshot.price_of("XRPBTC"), None);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_balance_lookup() {
        let balances: BalanceSnapshot = vec![("BTC".to_string(), dec!(0.5))].into_iter().collect();
        assert_eq!(balances.free("BTC"), Some(dec!(0.5)));
        assert_eq!(balances.free("ETH"), None);
    }

    #[test]
    fn test_deserialize_symbol_filters() {
        let json = r#"{
            "symbol": "ETHBTC",
            "filters": [
                {"filterType": "PRICE_FILTER", "minPrice": "0.00000100", "maxPrice": "922327.00000000", "tickSize": "0.00000100"},
                {"filterType": "LOT_SIZE", "minQty": "0.00010000", "maxQty": "100000.00000000", "stepSize": "0.00010000"},
                {"filterType": "ICEBERG_PARTS", "limit": 10}
            ]
        }"#;

        let info: SymbolInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.filters.len(), 3);
        assert_eq!(info.filters[2], SymbolFilter::Other);
        assert_eq!(info.lot_size_step().unwrap(), "0.00010000");
        assert_eq!(info.step_size().unwrap().tick(), 4);
    }

    #[test]
    fn test_missing_lot_size() {
        let info = SymbolInfo {
            symbol: "ETHBTC".into(),
            filters: vec![SymbolFilter::Other],
        };
        assert_eq!(
            info.lot_size_step(),
            Err(ExchangeRuleError::MissingLotSize("ETHBTC".into()))
        );
    }
}

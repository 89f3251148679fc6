//! Binance API response types.

use crate::error::BinanceRestError;
use execution_core::{Order, OrderSide, OrderStatus, OrderType, SymbolInfo, TickerPrice};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Response from GET /api/v3/time.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerTimeResponse {
    #[serde(rename = "serverTime")]
    pub server_time: i64,
}

/// One entry of GET /api/v3/ticker/price.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPriceResponse {
    pub symbol: String,
    #[serde(deserialize_with = "deserialize_decimal_from_str")]
    pub price: Decimal,
}

impl From<TickerPriceResponse> for TickerPrice {
    fn from(r: TickerPriceResponse) -> Self {
        TickerPrice::new(r.symbol, r.price)
    }
}

/// Response from GET /api/v3/account. Only balances are read.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub balances: Vec<AccountBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountBalance {
    pub asset: String,
    #[serde(deserialize_with = "deserialize_decimal_from_str")]
    pub free: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_from_str")]
    pub locked: Decimal,
}

/// Response from GET /api/v3/exchangeInfo.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<SymbolInfo>,
}

/// Order as returned by POST /api/v3/order (`RESULT`) and GET /api/v3/order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    pub symbol: String,
    #[serde(rename = "orderId")]
    pub order_id: u64,
    #[serde(rename = "clientOrderId")]
    pub client_order_id: String,
    /// Present on placement responses.
    #[serde(rename = "transactTime")]
    pub transact_time: Option<i64>,
    /// Present on query responses.
    #[serde(rename = "updateTime")]
    pub update_time: Option<i64>,
    #[serde(deserialize_with = "deserialize_decimal_from_str")]
    pub price: Decimal,
    #[serde(rename = "origQty", deserialize_with = "deserialize_decimal_from_str")]
    pub orig_qty: Decimal,
    #[serde(
        rename = "executedQty",
        deserialize_with = "deserialize_decimal_from_str"
    )]
    pub executed_qty: Decimal,
    #[serde(
        rename = "cummulativeQuoteQty",
        deserialize_with = "deserialize_decimal_from_str"
    )]
    pub cummulative_quote_qty: Decimal,
    pub status: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub side: String,
}

impl OrderResponse {
    /// Convert into the exchange-neutral order snapshot.
    pub fn into_order(self) -> Result<Order, BinanceRestError> {
        let status = OrderStatus::from_binance_str(&self.status)
            .ok_or_else(|| BinanceRestError::Parse(format!("unknown order status {}", self.status)))?;
        let side = OrderSide::from_binance_str(&self.side)
            .ok_or_else(|| BinanceRestError::Parse(format!("unknown order side {}", self.side)))?;
        let order_type = OrderType::from_binance_str(&self.order_type).ok_or_else(|| {
            BinanceRestError::Parse(format!("unknown order type {}", self.order_type))
        })?;

        let price = match order_type {
            OrderType::Market => None,
            OrderType::Limit => Some(self.price),
        };

        Ok(Order {
            order_id: self.order_id,
            symbol: self.symbol,
            side,
            order_type,
            status,
            quantity: self.orig_qty,
            price,
            executed_qty: self.executed_qty,
            cumulative_quote_qty: self.cummulative_quote_qty,
            updated_at_ms: self.update_time.or(self.transact_time).unwrap_or_default(),
        })
    }
}

/// Deserialize a Decimal from a string.
fn deserialize_decimal_from_str<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: &str = Deserialize::deserialize(deserializer)?;
    s.parse::<Decimal>().map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deserialize_server_time() {
        let json = r#"{"serverTime": 1499827319559}"#;
        let response: ServerTimeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.server_time, 1499827319559);
    }

    #[test]
    fn test_deserialize_tickers() {
        let json = r#"[{"symbol":"ETHBTC","price":"0.05210000"},{"symbol":"LTCBTC","price":"0.00123400"}]"#;
        let tickers: Vec<TickerPriceResponse> = serde_json::from_str(json).unwrap();
        assert_eq!(tickers.len(), 2);
        assert_eq!(tickers[1].price, dec!(0.001234));
    }

    #[test]
    fn test_deserialize_account() {
        let json = r#"{
            "makerCommission": 15,
            "canTrade": true,
            "balances": [
                {"asset": "BTC", "free": "4723846.89208129", "locked": "0.00000000"},
                {"asset": "LTC", "free": "4763368.68006011", "locked": "0.00000000"}
            ],
            "permissions": ["SPOT"]
        }"#;
        let account: AccountResponse = serde_json::from_str(json).unwrap();
        assert_eq!(account.balances.len(), 2);
        assert_eq!(account.balances[0].asset, "BTC");
        assert_eq!(account.balances[0].free, dec!(4723846.89208129));
    }

    #[test]
    fn test_deserialize_exchange_info() {
        let json = r#"{
            "timezone": "UTC",
            "serverTime": 1565246363776,
            "symbols": [{
                "symbol": "ETHBTC",
                "status": "TRADING",
                "baseAsset": "ETH",
                "quoteAsset": "BTC",
                "filters": [
                    {"filterType": "LOT_SIZE", "minQty": "0.00100000", "maxQty": "100000.00000000", "stepSize": "0.00100000"},
                    {"filterType": "MIN_NOTIONAL", "minNotional": "0.00010000"}
                ]
            }]
        }"#;
        let info: ExchangeInfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(info.symbols[0].symbol, "ETHBTC");
        assert_eq!(info.symbols[0].step_size().unwrap().tick(), 3);
    }

    #[test]
    fn test_placement_response_into_order() {
        let json = r#"{
            "symbol": "ETHBTC",
            "orderId": 28,
            "orderListId": -1,
            "clientOrderId": "6gCrw2kRUAF9CvJDGP16IP",
            "transactTime": 1507725176595,
            "price": "0.05200000",
            "origQty": "10.00000000",
            "executedQty": "0.00000000",
            "cummulativeQuoteQty": "0.00000000",
            "status": "NEW",
            "timeInForce": "GTC",
            "type": "LIMIT",
            "side": "BUY"
        }"#;

        let order = serde_json::from_str::<OrderResponse>(json)
            .unwrap()
            .into_order()
            .unwrap();
        assert_eq!(order.order_id, 28);
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.price, Some(dec!(0.052)));
        assert_eq!(order.updated_at_ms, 1507725176595);
    }

    #[test]
    fn test_query_response_into_order() {
        let json = r#"{
            "symbol": "ETHBTC",
            "orderId": 29,
            "orderListId": -1,
            "clientOrderId": "myOrder1",
            "price": "0.00000000",
            "origQty": "2.00000000",
            "executedQty": "2.00000000",
            "cummulativeQuoteQty": "0.10400000",
            "status": "FILLED",
            "timeInForce": "GTC",
            "type": "MARKET",
            "side": "SELL",
            "stopPrice": "0.00000000",
            "icebergQty": "0.00000000",
            "time": 1499827319559,
            "updateTime": 1499827319600,
            "isWorking": true
        }"#;

        let order = serde_json::from_str::<OrderResponse>(json)
            .unwrap()
            .into_order()
            .unwrap();
        assert!(order.is_filled());
        assert_eq!(order.price, None);
        assert_eq!(order.cumulative_quote_qty, dec!(0.104));
        assert_eq!(order.updated_at_ms, 1499827319600);
    }

    #[test]
    fn test_unknown_status_is_parse_error() {
        let json = r#"{
            "symbol": "ETHBTC", "orderId": 1, "clientOrderId": "x",
            "price": "0", "origQty": "1", "executedQty": "0", "cummulativeQuoteQty": "0",
            "status": "MYSTERY", "type": "LIMIT", "side": "BUY"
        }"#;
        let result = serde_json::from_str::<OrderResponse>(json)
            .unwrap()
            .into_order();
        assert!(matches!(result, Err(BinanceRestError::Parse(_))));
    }
}

//! Binance REST API client.

use crate::error::BinanceRestError;
use crate::responses::{
    AccountResponse, ExchangeInfoResponse, OrderResponse, ServerTimeResponse, TickerPriceResponse,
};
use auth::{ApiCredentials, RequestSigner};
use common::BinanceEnvironment;
use execution_core::{
    BalanceSnapshot, Order, OrderSide, OrderType, SymbolInfo, TickerPrice, TickerSnapshot,
};
use rest_client::RestClient;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Request timeout for Binance API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Binance REST API client with authentication support.
pub struct BinanceRestClient {
    client: RestClient,
    credentials: ApiCredentials,
    environment: BinanceEnvironment,
    /// Time offset between local clock and Binance server (local - server).
    time_offset_ms: AtomicI64,
}

impl BinanceRestClient {
    /// Create a new Binance REST client for production (`binance.com`).
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(credentials: ApiCredentials) -> Result<Self, BinanceRestError> {
        Self::with_environment(credentials, BinanceEnvironment::default())
    }

    /// Create a new Binance REST client for a specific environment.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_environment(
        credentials: ApiCredentials,
        environment: BinanceEnvironment,
    ) -> Result<Self, BinanceRestError> {
        let client = RestClient::new(&environment.rest_base_url(), REQUEST_TIMEOUT)?;

        Ok(Self {
            client,
            credentials,
            environment,
            time_offset_ms: AtomicI64::new(0),
        })
    }

    /// Get the environment this client is connected to.
    pub fn environment(&self) -> &BinanceEnvironment {
        &self.environment
    }

    /// Get the current server timestamp adjusted for time offset.
    pub fn server_timestamp_ms(&self) -> i64 {
        local_timestamp_ms() - self.time_offset_ms.load(Ordering::Relaxed)
    }

    // ========================================================================
    // Time Synchronization
    // ========================================================================

    /// Synchronize with Binance server time.
    ///
    /// Signed requests carry a timestamp the server checks against
    /// `recvWindow`; call on startup and again if timestamps are rejected.
    pub async fn sync_time(&self) -> Result<(), BinanceRestError> {
        let before = std::time::Instant::now();
        let response: ServerTimeResponse = self.client.get("/api/v3/time", None, None).await?;
        let rtt = before.elapsed().as_millis() as i64;

        let local_time = local_timestamp_ms();

        // Estimate server time at midpoint of request
        let estimated_server_time = response.server_time + (rtt / 2);
        let offset = local_time - estimated_server_time;

        self.time_offset_ms.store(offset, Ordering::Relaxed);

        tracing::info!(
            server_time = response.server_time,
            local_time = local_time,
            offset_ms = offset,
            rtt_ms = rtt,
            "Time synchronized with Binance server"
        );

        Ok(())
    }

    // ========================================================================
    // Market Data
    // ========================================================================

    /// Last price of every symbol.
    ///
    /// GET /api/v3/ticker/price
    pub async fn get_all_tickers(&self) -> Result<TickerSnapshot, BinanceRestError> {
        let response: Vec<TickerPriceResponse> =
            self.client.get("/api/v3/ticker/price", None, None).await?;

        tracing::debug!(symbols = response.len(), "Tickers received");

        Ok(response
            .into_iter()
            .map(TickerPrice::from)
            .collect::<Vec<_>>()
            .into())
    }

    /// Last price of one symbol.
    ///
    /// GET /api/v3/ticker/price?symbol=
    pub async fn get_symbol_ticker(&self, symbol: &str) -> Result<TickerPrice, BinanceRestError> {
        let query = format!("symbol={}", symbol);
        let response: TickerPriceResponse = self
            .client
            .get("/api/v3/ticker/price", Some(&query), None)
            .await?;
        Ok(response.into())
    }

    /// Trading rules for one symbol.
    ///
    /// GET /api/v3/exchangeInfo?symbol=
    pub async fn get_symbol_info(&self, symbol: &str) -> Result<SymbolInfo, BinanceRestError> {
        let query = format!("symbol={}", symbol);
        let response: ExchangeInfoResponse = self
            .client
            .get("/api/v3/exchangeInfo", Some(&query), None)
            .await?;

        response
            .symbols
            .into_iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| BinanceRestError::SymbolNotFound(symbol.to_string()))
    }

    // ========================================================================
    // Account
    // ========================================================================

    /// Free balance of every asset.
    ///
    /// GET /api/v3/account (signed)
    pub async fn get_balances(&self) -> Result<BalanceSnapshot, BinanceRestError> {
        let signed_query = self.signed_query(&[])?;
        let response: AccountResponse = self
            .client
            .get(
                "/api/v3/account",
                Some(&signed_query),
                Some(self.credentials.api_key()),
            )
            .await?;

        Ok(response
            .balances
            .into_iter()
            .map(|b| (b.asset, b.free))
            .collect())
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Place a new order.
    ///
    /// POST /api/v3/order (signed)
    ///
    /// `price` is required for limit orders, which are sent good-till-canceled.
    pub async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        order_type: OrderType,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Result<Order, BinanceRestError> {
        let mut params: Vec<(&str, String)> = vec![
            ("symbol", symbol.to_string()),
            ("side", side.as_binance_str().to_string()),
            ("type", order_type.as_binance_str().to_string()),
            ("quantity", quantity.normalize().to_string()),
            ("newOrderRespType", "RESULT".to_string()),
        ];

        if order_type == OrderType::Limit {
            let price = price.ok_or_else(|| BinanceRestError::InvalidOrder {
                code: -1102,
                message: "limit order without price".to_string(),
            })?;
            params.push(("price", price.normalize().to_string()));
            params.push(("timeInForce", "GTC".to_string()));
        }

        let signed_query = self.signed_query(&params)?;

        tracing::info!(
            symbol = %symbol,
            side = ?side,
            order_type = ?order_type,
            quantity = %quantity,
            price = ?price,
            "Placing order"
        );

        let response: OrderResponse = self
            .client
            .post(
                "/api/v3/order",
                Some(&signed_query),
                Some(self.credentials.api_key()),
            )
            .await?;

        tracing::info!(
            order_id = response.order_id,
            status = %response.status,
            "Order placed"
        );

        response.into_order()
    }

    /// Query an order by exchange order ID.
    ///
    /// GET /api/v3/order (signed)
    pub async fn query_order_by_id(
        &self,
        symbol: &str,
        order_id: u64,
    ) -> Result<Order, BinanceRestError> {
        let params = [
            ("symbol", symbol.to_string()),
            ("orderId", order_id.to_string()),
        ];
        let signed_query = self.signed_query(&params)?;

        let response: OrderResponse = self
            .client
            .get(
                "/api/v3/order",
                Some(&signed_query),
                Some(self.credentials.api_key()),
            )
            .await?;

        response.into_order()
    }

    fn signed_query(&self, params: &[(&str, String)]) -> Result<String, BinanceRestError> {
        let signer = RequestSigner::new(&self.credentials);
        Ok(signer.signed_query(params, self.server_timestamp_ms())?)
    }
}

fn local_timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl std::fmt::Debug for BinanceRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceRestClient")
            .field("environment", &self.environment)
            .field("base_url", &self.client.base_url())
            .field("credentials", &self.credentials)
            .field(
                "time_offset_ms",
                &self.time_offset_ms.load(Ordering::Relaxed),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(environment: BinanceEnvironment) -> BinanceRestClient {
        let credentials = ApiCredentials::new("key".into(), "hunter2-secret-value".into()).unwrap();
        BinanceRestClient::with_environment(credentials, environment).unwrap()
    }

    #[test]
    fn test_server_timestamp_uses_offset() {
        let client = client(BinanceEnvironment::Testnet);
        client.time_offset_ms.store(1_000, Ordering::Relaxed);

        let expected = local_timestamp_ms() - 1_000;
        let actual = client.server_timestamp_ms();
        assert!((actual - expected).abs() < 100);
    }

    #[test]
    fn test_signed_query_has_signature() {
        let client = client(BinanceEnvironment::Testnet);
        let query = client
            .signed_query(&[("symbol", "ETHBTC".to_string())])
            .unwrap();

        assert!(query.starts_with("symbol=ETHBTC&recvWindow="));
        assert!(query.contains("&signature="));
    }

    #[test]
    fn test_debug_hides_secret() {
        let client = client(BinanceEnvironment::production("us"));
        let debug = format!("{:?}", client);
        assert!(debug.contains("binance.us"));
        assert!(!debug.contains("hunter2-secret-value"));
    }
}

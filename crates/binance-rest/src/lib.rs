//! Binance REST API client.
//!
//! This crate provides a typed client for the Binance spot REST API with:
//!
//! - **Time synchronization**: Adjusts for clock skew between local and server time
//! - **Market data**: ticker prices and per-symbol trading rules
//! - **Account**: free balances
//! - **Order management**: place limit buys and market sells, query orders by ID
//! - **Error handling**: Typed errors with specific variants for common cases,
//!   mapped onto `ExchangeError` for the executor
//!
//! `BinanceRestClient` implements `execution_core::ExchangeClient`.
//!
//! # Example
//!
//! ```rust,ignore
//! use auth::ApiCredentials;
//! use binance_rest::BinanceRestClient;
//! use common::BinanceEnvironment;
//!
//! let credentials = ApiCredentials::from_env()?;
//! let client = BinanceRestClient::with_environment(credentials, BinanceEnvironment::from_env())?;
//!
//! // Sync time with Binance server
//! client.sync_time().await?;
//!
//! let ticker = client.get_symbol_ticker("ETHBTC").await?;
//! ```

mod client;
mod error;
mod exchange;
mod responses;

pub use client::BinanceRestClient;
pub use error::BinanceRestError;
pub use responses::{
    AccountBalance, AccountResponse, ExchangeInfoResponse, OrderResponse, ServerTimeResponse,
    TickerPriceResponse,
};

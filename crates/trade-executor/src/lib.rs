//! Trade execution runtime for the altcoin switcher.
//!
//! This crate turns one buy or sell decision into a confirmed fill:
//!
//! - **OrderSubmitter**: places the order, waiting between rejected placements
//! - **OrderConfirmationPoller**: bounded polling until the order is visible,
//!   filled, or (for sells) reflected in the account balance
//! - **TradeExecutor**: the buy and sell flows, trade log writes and metrics
//! - **retry**: reruns a whole trade up to a fixed number of attempts and
//!   reports `RetryExhausted` when they run out
//! - **SimulatedExchange**: scripted in-memory `ExchangeClient` for tests and
//!   dry runs
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐     ┌────────────────┐     ┌────────────────┐
//! │ TradeExecutor │────>│ OrderSubmitter │────>│ ExchangeClient │
//! │ - quantity    │     └────────────────┘     │ (Binance REST, │
//! │ - trade log   │     ┌────────────────┐     │  simulated)    │
//! │ - retry       │────>│ Confirmation   │────>│                │
//! └───────────────┘     │ Poller         │     └────────────────┘
//!                       └────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use trade_executor::{ExecutorConfig, TradeExecutor};
//!
//! let executor = TradeExecutor::new(client, JsonlTradeLog::new("trades.jsonl"))
//!     .with_config(ExecutorConfig::default())
//!     .with_metrics(metrics);
//!
//! let tickers = executor.exchange().all_tickers().await?;
//! let order = executor.buy_alt(&Coin::new("ETH"), &Coin::new("BTC"), &tickers).await?;
//! ```

mod cancel;
mod config;
mod error;
mod executor;
mod poller;
mod retry;
mod simulated;
mod submitter;

pub use cancel::{cancellation, Cancellation};
pub use config::{ExecutorConfig, PollPolicy, RetryPolicy, SubmitPolicy};
pub use error::{PollPhase, RetryExhausted, TradeError};
pub use executor::TradeExecutor;
pub use poller::OrderConfirmationPoller;
pub use retry::retry;
pub use simulated::{OrderStep, SimulatedExchange};
pub use submitter::{OrderRequest, OrderSubmitter};

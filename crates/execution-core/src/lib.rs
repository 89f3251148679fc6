//! Core execution types and the exchange port.
//!
//! This crate provides the fundamental types for turning one trade decision
//! into a confirmed fill:
//!
//! - **Coins and intents**: `Coin`, `TradeSide`, `TradeIntent`
//! - **Order types**: `Order`, `OrderSide`, `OrderType`, `OrderStatus`
//! - **Lot-size rounding**: `StepSize` derives the permitted precision from an
//!   exchange `LOT_SIZE` filter and rounds quantities down to it
//! - **Market data**: `TickerSnapshot`, `BalanceSnapshot`, `SymbolInfo`
//! - **Exchange port**: the `ExchangeClient` trait with its `ExchangeError` taxonomy
//! - **Trade log**: `TradeRecord` with its two write phases and `TradeLogStore`
//!
//! # Trade Record Lifecycle
//!
//! 1. A `TradeRecord` is created from a `TradeIntent` (state `Starting`)
//! 2. Once the exchange accepts the order, `set_ordered` stores the balances and quantity
//! 3. Once the order is filled, `set_complete` stores the filled quote quantity
//!
//! `set_complete` is refused without a prior `set_ordered`, and a completed
//! record accepts no further writes.

mod coin;
mod exchange;
mod market;
mod order;
mod quantity;
mod trade_log;

pub use coin::{Coin, TradeIntent, TradeSide};
pub use exchange::{ExchangeClient, ExchangeError};
pub use market::{BalanceSnapshot, SymbolFilter, SymbolInfo, TickerPrice, TickerSnapshot};
pub use order::{Order, OrderSide, OrderStatus, OrderType};
pub use quantity::{rounded_quantity, ExchangeRuleError, StepSize};
pub use trade_log::{
    CompletedPhase, InMemoryTradeLog, JsonlTradeLog, OrderedPhase, TradeLogError, TradeLogStore,
    TradeRecord, TradeState,
};
